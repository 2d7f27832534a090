// src/models/dashboard.rs

use serde::Serialize;

use crate::models::member::Member;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub active_members: i64,
    // Últimos 5 cadastrados
    pub recent_members: Vec<Member>,
}
