// tests/tenant_isolation_test.rs
//
// Propriedades de isolamento entre igrejas, rodando sobre o MemoryStore
// com a mesma cadeia de interceptores da aplicação.

use std::{
    collections::BTreeSet,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
};

use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use ekklesia::{
    common::error::AppError,
    db::{
        context::{Actor, OperationContext, TenantContextProvider},
        interceptor::{FallbackPolicy, Interceptor, InterceptorChain, Operation, TenantIsolation},
        memory::MemoryStore,
        query::{Direction, Entity, Select},
        registry::ScopedEntityRegistry,
        session::Session,
        store::Store,
        LedgerRepository, MemberRepository,
    },
    models::{
        auth::Role,
        ledger::{EntryKind, LedgerEntry, LedgerLine, LedgerSummary},
        member::Member,
        tenancy::TenantId,
    },
};

// --- Fixture: Igreja A tem "Alice", Igreja B tem "Bob" ---

struct World {
    store: MemoryStore,
    chain: Arc<InterceptorChain>,
    church_a: TenantId,
    church_b: TenantId,
    alice: Member,
    bob: Member,
}

fn member(tenant: TenantId, name: &str, cpf: &str, second: u32) -> Member {
    let created = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, second).unwrap();
    Member {
        id: Uuid::new_v4(),
        tenant_id: tenant,
        name: name.to_string(),
        sex: None,
        marital_status: None,
        rg: None,
        cpf: Some(cpf.to_string()),
        address: None,
        phone: None,
        birth_date: None,
        baptism_date: None,
        position: "Membro".to_string(),
        active: true,
        created_at: created,
        updated_at: created,
        deleted_at: None,
    }
}

fn entry(tenant: TenantId, kind: EntryKind, amount: i64, member_id: Option<Uuid>) -> LedgerEntry {
    LedgerEntry {
        id: Uuid::new_v4(),
        tenant_id: tenant,
        entry_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        kind,
        category: "Dízimo".to_string(),
        description: None,
        amount: Decimal::from(amount),
        member_id,
        created_at: Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap(),
    }
}

fn chain(fallback: FallbackPolicy) -> Arc<InterceptorChain> {
    Arc::new(InterceptorChain::standard(
        Arc::new(ScopedEntityRegistry::standard()),
        fallback,
    ))
}

fn world(fallback: FallbackPolicy) -> World {
    let store = MemoryStore::new();
    let church_a = TenantId::new();
    let church_b = TenantId::new();
    let alice = member(church_a, "Alice", "111.111.111-11", 1);
    let bob = member(church_b, "Bob", "222.222.222-22", 2);

    store.insert(Entity::Member, &alice).unwrap();
    store.insert(Entity::Member, &bob).unwrap();
    store.insert(Entity::LedgerEntry, &entry(church_a, EntryKind::Income, 100, Some(alice.id))).unwrap();
    store.insert(Entity::LedgerEntry, &entry(church_b, EntryKind::Income, 50, Some(bob.id))).unwrap();
    store.insert(Entity::LedgerEntry, &entry(church_b, EntryKind::Expense, 20, None)).unwrap();

    World { store, chain: chain(fallback), church_a, church_b, alice, bob }
}

fn actor_of(tenant: TenantId) -> OperationContext {
    OperationContext::for_actor(Actor {
        user_id: Uuid::new_v4(),
        tenant_id: tenant,
        role: Role::Admin,
    })
}

impl World {
    fn session(&self, ctx: OperationContext) -> Session {
        Session::new(Store::Memory(self.store.clone()), self.chain.clone(), ctx)
    }
}

fn names(members: &[Member]) -> Vec<String> {
    members.iter().map(|m| m.name.clone()).collect()
}

fn all_members() -> Select {
    Select::new(Entity::Member).order_by("name", Direction::Asc)
}

// --- Isolamento ---

#[tokio::test]
async fn each_church_sees_only_its_own_members() {
    let w = world(FallbackPolicy::Open);

    let as_b: Vec<Member> = w.session(actor_of(w.church_b)).fetch_all(all_members()).await.unwrap();
    assert_eq!(names(&as_b), vec!["Bob"]);

    let as_a: Vec<Member> = w.session(actor_of(w.church_a)).fetch_all(all_members()).await.unwrap();
    assert_eq!(names(&as_a), vec!["Alice"]);
}

#[tokio::test]
async fn lookups_by_id_do_not_cross_churches() {
    let w = world(FallbackPolicy::Open);
    let repo = MemberRepository::new();
    let session_b = w.session(actor_of(w.church_b));

    assert!(repo.find_visible(&session_b, w.alice.id).await.unwrap().is_none());
    assert!(repo.find_any(&session_b, w.alice.id).await.unwrap().is_none());
    assert!(repo.find_by_cpf(&session_b, "111.111.111-11").await.unwrap().is_none());
    assert_eq!(
        repo.find_visible(&session_b, w.bob.id).await.unwrap().map(|m| m.name),
        Some("Bob".to_string())
    );
}

#[tokio::test]
async fn joined_reads_are_filtered_on_every_alias() {
    let w = world(FallbackPolicy::Open);
    // Lançamento da igreja B apontando para a Alice (vínculo forjado)
    w.store
        .insert(Entity::LedgerEntry, &entry(w.church_b, EntryKind::Income, 7, Some(w.alice.id)))
        .unwrap();

    let session_b = w.session(actor_of(w.church_b));
    let lines = LedgerRepository::new().list_lines(&session_b).await.unwrap();

    assert_eq!(lines.len(), 3);
    assert!(lines.iter().all(|l| l.tenant_id == w.church_b));
    let joined_names: BTreeSet<Option<String>> =
        lines.iter().map(|l| l.member_name.clone()).collect();
    assert!(!joined_names.contains(&Some("Alice".to_string())));
    assert!(joined_names.contains(&Some("Bob".to_string())));

    // Mesma forma, com INNER JOIN e alias: membros que têm lançamento
    let givers: Vec<Member> = session_b
        .fetch_all(
            Select::new(Entity::Member)
                .inner_join(Entity::LedgerEntry, "l", "member_id", "id")
                .order_by("name", Direction::Asc),
        )
        .await
        .unwrap();
    assert_eq!(names(&givers), vec!["Bob"]);
}

#[tokio::test]
async fn ledger_summary_only_counts_own_entries() {
    let w = world(FallbackPolicy::Open);
    let lines: Vec<LedgerLine> = LedgerRepository::new()
        .list_lines(&w.session(actor_of(w.church_b)))
        .await
        .unwrap();
    let summary = LedgerSummary::from_lines(&lines);

    assert_eq!(summary.income, Decimal::from(50));
    assert_eq!(summary.expense, Decimal::from(20));
    assert_eq!(summary.balance, Decimal::from(30));
}

// --- Transparência ---

#[tokio::test]
async fn implicit_filter_matches_an_explicit_one() {
    let w = world(FallbackPolicy::Open);
    for tenant in [w.church_a, w.church_b] {
        let session = w.session(actor_of(tenant));
        let implicit: Vec<Member> = session.fetch_all(all_members()).await.unwrap();
        let explicit: Vec<Member> = session
            .fetch_all(all_members().where_eq("tenant_id", tenant))
            .await
            .unwrap();

        let ids = |ms: &[Member]| ms.iter().map(|m| m.id).collect::<Vec<_>>();
        assert_eq!(ids(&implicit), ids(&explicit));
    }
}

// --- Sem contexto ---

#[tokio::test]
async fn anonymous_reads_are_unfiltered_by_default() {
    let w = world(FallbackPolicy::Open);

    let rows: Vec<Member> = w.session(OperationContext::anonymous()).fetch_all(all_members()).await.unwrap();
    assert_eq!(names(&rows), vec!["Alice", "Bob"]);

    let rows: Vec<Member> = w.session(OperationContext::system()).fetch_all(all_members()).await.unwrap();
    assert_eq!(names(&rows), vec!["Alice", "Bob"]);
}

#[tokio::test]
async fn closed_fallback_hides_everything_from_anonymous_but_not_from_system() {
    let w = world(FallbackPolicy::Closed);

    let rows: Vec<Member> = w.session(OperationContext::anonymous()).fetch_all(all_members()).await.unwrap();
    assert!(rows.is_empty());
    let count = w.session(OperationContext::anonymous()).count(all_members()).await.unwrap();
    assert_eq!(count, 0);

    let rows: Vec<Member> = w.session(OperationContext::system()).fetch_all(all_members()).await.unwrap();
    assert_eq!(names(&rows), vec!["Alice", "Bob"]);

    // Um usuário autenticado continua vendo a própria igreja
    let rows: Vec<Member> = w.session(actor_of(w.church_a)).fetch_all(all_members()).await.unwrap();
    assert_eq!(names(&rows), vec!["Alice"]);
}

// --- Anti-recursão ---

#[derive(Default)]
struct Watch {
    resolving: AtomicBool,
    reentrant_calls: AtomicUsize,
    resolutions: AtomicUsize,
}

// Interceptor espião: denuncia qualquer execução durante a resolução do tenant
struct ReentrancyWatch(Arc<Watch>);

impl Interceptor for ReentrancyWatch {
    fn before_execute(
        &self,
        _op: &mut Operation<'_>,
        _ctx: &dyn TenantContextProvider,
    ) -> Result<(), AppError> {
        if self.0.resolving.load(Ordering::SeqCst) {
            self.0.reentrant_calls.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

// Provedor real, instrumentado
struct WatchedContext {
    inner: OperationContext,
    watch: Arc<Watch>,
}

impl TenantContextProvider for WatchedContext {
    fn is_authenticated(&self) -> bool {
        self.inner.is_authenticated()
    }

    fn tenant_id(&self) -> Option<TenantId> {
        self.watch.resolving.store(true, Ordering::SeqCst);
        self.watch.resolutions.fetch_add(1, Ordering::SeqCst);
        let tenant = self.inner.tenant_id();
        self.watch.resolving.store(false, Ordering::SeqCst);
        tenant
    }
}

// Provedor ingênuo: busca o tenant com uma consulta que passa pela cadeia
struct QueryingContext {
    tenant: TenantId,
    chain: Arc<InterceptorChain>,
    watch: Arc<Watch>,
}

impl TenantContextProvider for QueryingContext {
    fn is_authenticated(&self) -> bool {
        true
    }

    fn tenant_id(&self) -> Option<TenantId> {
        if self.watch.resolving.swap(true, Ordering::SeqCst) {
            return Some(self.tenant);
        }
        let mut lookup = Select::new(Entity::User).where_eq("id", Uuid::new_v4());
        let _ = self.chain.run(&mut Operation::Read(&mut lookup), self);
        self.watch.resolving.store(false, Ordering::SeqCst);
        Some(self.tenant)
    }
}

fn watched_chain(watch: &Arc<Watch>) -> Arc<InterceptorChain> {
    Arc::new(
        InterceptorChain::new()
            .with(ReentrancyWatch(watch.clone()))
            .with(TenantIsolation::new(
                Arc::new(ScopedEntityRegistry::standard()),
                FallbackPolicy::Open,
            )),
    )
}

#[test]
fn resolving_the_tenant_never_reenters_the_pipeline() {
    let w = world(FallbackPolicy::Open);
    let watch = Arc::new(Watch::default());
    let chain = watched_chain(&watch);
    let ctx = WatchedContext { inner: actor_of(w.church_b), watch: watch.clone() };

    let mut select = all_members();
    chain.run(&mut Operation::Read(&mut select), &ctx).unwrap();

    assert_eq!(watch.reentrant_calls.load(Ordering::SeqCst), 0);
    assert!(watch.resolutions.load(Ordering::SeqCst) >= 1);

    let rows = w.store.fetch(&select).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "Bob");
}

#[test]
fn the_watch_catches_a_provider_that_queries() {
    let w = world(FallbackPolicy::Open);
    let watch = Arc::new(Watch::default());
    let chain = watched_chain(&watch);
    let ctx = QueryingContext { tenant: w.church_a, chain: chain.clone(), watch: watch.clone() };

    let mut select = all_members();
    chain.run(&mut Operation::Read(&mut select), &ctx).unwrap();

    assert!(watch.reentrant_calls.load(Ordering::SeqCst) > 0);
}

// --- Idempotência ---

#[test]
fn applying_the_filter_twice_changes_nothing() {
    let w = world(FallbackPolicy::Open);
    let isolation = TenantIsolation::new(Arc::new(ScopedEntityRegistry::standard()), FallbackPolicy::Open);

    let shape = || {
        Select::new(Entity::LedgerEntry)
            .left_join(Entity::Member, "m", "id", "member_id")
            .column("m", "name", "member_name")
            .order_by("amount", Direction::Asc)
    };

    let mut once = shape();
    isolation.apply(&mut once, w.church_b);

    let mut twice = shape();
    isolation.apply(&mut twice, w.church_b);
    isolation.apply(&mut twice, w.church_b);

    assert_eq!(once.conditions(), twice.conditions());
    assert_eq!(once.to_query_builder().sql(), twice.to_query_builder().sql());
    assert_eq!(w.store.fetch(&once).unwrap(), w.store.fetch(&twice).unwrap());
}

// --- Concorrência ---

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sessions_never_see_each_others_rows() {
    let w = Arc::new(world(FallbackPolicy::Open));

    let mut handles = Vec::new();
    for i in 0..50 {
        let w = w.clone();
        handles.push(tokio::spawn(async move {
            let (tenant, expected) = if i % 2 == 0 {
                (w.church_a, "Alice")
            } else {
                (w.church_b, "Bob")
            };
            let session = w.session(actor_of(tenant));
            tokio::task::yield_now().await;
            let rows: Vec<Member> = session.fetch_all(all_members()).await.unwrap();
            assert_eq!(names(&rows), vec![expected]);
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
}

// --- Gravações ---

#[test]
fn writes_must_be_stamped_with_the_actors_church() {
    let w = world(FallbackPolicy::Open);
    let session_a = w.session(actor_of(w.church_a));

    assert!(session_a.authorize_write(Entity::Member, Some(w.church_a)).is_ok());
    assert!(matches!(
        session_a.authorize_write(Entity::Member, Some(w.church_b)),
        Err(AppError::TenantMismatch { .. })
    ));
    assert!(matches!(
        session_a.authorize_write(Entity::LedgerEntry, None),
        Err(AppError::TenantRequired)
    ));
    // users é isento: filtrado explicitamente pelo serviço
    assert!(session_a.authorize_write(Entity::User, None).is_ok());
}

#[tokio::test]
async fn archived_members_leave_the_active_list_and_dashboard() {
    let w = world(FallbackPolicy::Open);
    let mut archived = member(w.church_a, "Carlos", "333.333.333-33", 3);
    archived.deleted_at = Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
    archived.active = false;
    w.store.insert(Entity::Member, &archived).unwrap();
    w.store.insert(Entity::Member, &member(w.church_a, "Davi", "444.444.444-44", 4)).unwrap();

    let repo = MemberRepository::new();
    let session_a = w.session(actor_of(w.church_a));

    assert_eq!(names(&repo.list_active(&session_a).await.unwrap()), vec!["Alice", "Davi"]);
    assert_eq!(repo.count_active(&session_a).await.unwrap(), 2);
    assert_eq!(names(&repo.recent(&session_a, 5).await.unwrap()), vec!["Davi", "Alice"]);

    // Continua encontrável para reativação, mas só pela própria igreja
    let found = repo.find_any(&session_a, archived.id).await.unwrap().unwrap();
    assert!(found.is_archived());
    let session_b = w.session(actor_of(w.church_b));
    assert!(repo.find_any(&session_b, archived.id).await.unwrap().is_none());
}
