// src/services/dashboard_service.rs

use crate::{
    common::error::AppError,
    db::{session::Session, MemberRepository},
    models::dashboard::DashboardSummary,
};

const RECENT_MEMBERS: i64 = 5;

#[derive(Clone)]
pub struct DashboardService {
    member_repo: MemberRepository,
}

impl DashboardService {
    pub fn new(member_repo: MemberRepository) -> Self {
        Self { member_repo }
    }

    pub async fn get_summary(&self, session: &Session) -> Result<DashboardSummary, AppError> {
        let active_members = self.member_repo.count_active(session).await?;
        let recent_members = self.member_repo.recent(session, RECENT_MEMBERS).await?;
        Ok(DashboardSummary { active_members, recent_members })
    }
}
