use corpstore_core::db::open_db_in_memory;
use corpstore_core::{
    default_registry, Employee, EntityRegistry, FieldValue, GenericRepository, InMemorySession,
    PersistenceSession, QueryBuilder, RepoError, SessionRepository, SqliteSession,
};

type Row = (&'static str, &'static str, Option<&'static str>, f64);

const STAFF: &[Row] = &[
    ("Ali", "Yılmaz", Some("ali.yilmaz@example.com"), 4500.0),
    ("Ayşe", "Kara", None, 6000.0),
    ("Can", "Demir", Some("can.demir@example.com"), 4500.0),
    ("ali", "Kara", Some("ali.kara@example.org"), 5000.0),
    ("Elif", "Kara", None, 7000.0),
    ("Burcu", "Demirci", Some("burcu.demirci@example.com"), 8000.0),
    ("Cem", "Tekin", None, 4500.0),
];

fn seed<S: PersistenceSession>(session: &S, rows: &[Row]) -> Vec<Employee> {
    let repo = SessionRepository::new(session);
    rows.iter()
        .map(|(first, last, email, salary)| {
            let employee = Employee::new(*first, *last, email.map(str::to_string), Some(*salary));
            repo.save(&employee).unwrap()
        })
        .collect()
}

fn ids(rows: &[Employee]) -> Vec<i64> {
    rows.iter().map(|employee| employee.id.unwrap()).collect()
}

fn builder<S: PersistenceSession>(session: &S) -> QueryBuilder<'_, S, Employee> {
    QueryBuilder::for_entity(session).unwrap()
}

/// Runs `$check` against a fresh SQLite session and a fresh in-memory session.
macro_rules! on_each_backend {
    ($check:ident) => {{
        let conn = open_db_in_memory().unwrap();
        $check(&SqliteSession::new(&conn, default_registry().unwrap()));
        $check(&InMemorySession::new(default_registry().unwrap()));
    }};
}

#[test]
fn conjunction_returns_exactly_the_matching_rows() {
    fn check<S: PersistenceSession>(session: &S) {
        let staff = seed(session, STAFF);
        let expected = |keep: &dyn Fn(&Employee) -> bool| {
            staff
                .iter()
                .filter(|employee| keep(employee))
                .map(|employee| employee.id.unwrap())
                .collect::<Vec<_>>()
        };

        let mut query = builder(session);
        query
            .where_equals("lastName", "Kara")
            .unwrap()
            .where_like("firstName", "A%")
            .unwrap();
        assert_eq!(
            ids(&query.execute().unwrap()),
            expected(&|e: &Employee| e.last_name == "Kara" && e.first_name.starts_with('A'))
        );

        let mut query = builder(session);
        query
            .where_like("email", "%@example.com")
            .unwrap()
            .where_equals("salary", 4500.0)
            .unwrap();
        assert_eq!(
            ids(&query.execute().unwrap()),
            expected(&|e: &Employee| {
                e.salary == Some(4500.0)
                    && e.email.as_deref().is_some_and(|email| email.ends_with("@example.com"))
            })
        );

        let mut query = builder(session);
        query.where_equals("email", FieldValue::Null).unwrap();
        assert_eq!(
            ids(&query.execute().unwrap()),
            expected(&|e: &Employee| e.email.is_none())
        );

        let mut query = builder(session);
        query.where_like("lastName", "Demir__").unwrap();
        assert_eq!(
            ids(&query.execute().unwrap()),
            expected(&|e: &Employee| e.last_name == "Demirci")
        );
    }
    on_each_backend!(check);
}

#[test]
fn zero_conditions_select_every_row_in_identity_order() {
    fn check<S: PersistenceSession>(session: &S) {
        let staff = seed(session, STAFF);
        let rows = builder(session).execute().unwrap();
        assert_eq!(rows, staff);
    }
    on_each_backend!(check);
}

#[test]
fn like_is_case_sensitive_on_every_backend() {
    fn check<S: PersistenceSession>(session: &S) {
        seed(session, STAFF);
        let mut query = builder(session);
        query.where_like("firstName", "ali").unwrap();
        let rows = query.execute().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].last_name, "Kara");
    }
    on_each_backend!(check);
}

#[test]
fn re_adding_a_condition_overwrites_the_previous_one() {
    fn check<S: PersistenceSession>(session: &S) {
        seed(session, STAFF);

        let mut overwritten = builder(session);
        overwritten
            .where_equals("lastName", "Kara")
            .unwrap()
            .where_equals("lastName", "Demir")
            .unwrap();

        let mut direct = builder(session);
        direct.where_equals("lastName", "Demir").unwrap();

        assert_eq!(overwritten.execute().unwrap(), direct.execute().unwrap());
        assert_eq!(overwritten.compile(), direct.compile());
    }
    on_each_backend!(check);
}

#[test]
fn pages_are_slices_of_the_full_result() {
    fn check<S: PersistenceSession>(session: &S) {
        seed(session, STAFF);

        let mut full_query = builder(session);
        full_query.order_by("firstName", true).unwrap();
        let full = full_query.execute().unwrap();

        for page in 1..=4_i64 {
            let mut query = builder(session);
            query
                .order_by("firstName", true)
                .unwrap()
                .paginate(page, 3)
                .unwrap();
            let rows = query.execute().unwrap();

            let offset = ((page - 1) * 3) as usize;
            let expected = full.iter().skip(offset).take(3).cloned().collect::<Vec<_>>();
            assert!(rows.len() <= 3);
            assert_eq!(rows, expected, "page {page}");
        }
    }
    on_each_backend!(check);
}

#[test]
fn descending_order_is_the_exact_reverse_of_ascending() {
    fn check<S: PersistenceSession>(session: &S) {
        seed(session, STAFF);

        let mut ascending = builder(session);
        ascending.order_by("firstName", true).unwrap();
        let ascending = ids(&ascending.execute().unwrap());
        assert_eq!(ascending, vec![1, 4, 2, 6, 3, 7, 5]);

        let mut descending = builder(session);
        descending.order_by("firstName", false).unwrap();
        let mut descending = ids(&descending.execute().unwrap());
        descending.reverse();
        assert_eq!(descending, ascending);
    }
    on_each_backend!(check);
}

#[test]
fn text_order_folds_non_ascii_case() {
    fn check<S: PersistenceSession>(session: &S) {
        seed(
            session,
            &[
                ("Deniz", "Öztürk", None, 5000.0),
                ("Ece", "öcal", None, 5000.0),
                ("Mert", "Çelik", None, 5000.0),
                ("Selin", "çakır", None, 5000.0),
            ],
        );
        let repo = SessionRepository::new(session);

        let last_names = |ascending| {
            repo.find_all_sorted::<Employee>("lastName", ascending)
                .unwrap()
                .into_iter()
                .map(|employee| employee.last_name)
                .collect::<Vec<_>>()
        };
        assert_eq!(last_names(true), vec!["çakır", "Çelik", "öcal", "Öztürk"]);
        assert_eq!(last_names(false), vec!["Öztürk", "öcal", "Çelik", "çakır"]);
    }
    on_each_backend!(check);
}

#[test]
fn numeric_order_breaks_ties_by_identity() {
    fn check<S: PersistenceSession>(session: &S) {
        seed(session, STAFF);
        let mut query = builder(session);
        query.order_by("salary", true).unwrap();
        assert_eq!(ids(&query.execute().unwrap()), vec![1, 3, 7, 4, 2, 5, 6]);
    }
    on_each_backend!(check);
}

#[test]
fn builder_state_persists_across_executions() {
    fn check<S: PersistenceSession>(session: &S) {
        seed(session, STAFF);
        let mut query = builder(session);
        query
            .where_equals("lastName", "Kara")
            .unwrap()
            .order_by("salary", false)
            .unwrap();

        let first = query.execute().unwrap();
        let second = query.execute().unwrap();
        assert_eq!(first, second);
        assert_eq!(ids(&first), vec![5, 2, 4]);

        query.paginate(1, 1).unwrap();
        assert_eq!(ids(&query.execute().unwrap()), vec![5]);
        assert_eq!(query.count().unwrap(), 3);

        query.where_equals("lastName", "Tekin").unwrap();
        assert_eq!(ids(&query.execute().unwrap()), vec![7]);
    }
    on_each_backend!(check);
}

#[test]
fn invalid_criteria_fail_without_changing_the_builder() {
    fn check<S: PersistenceSession>(session: &S) {
        seed(session, STAFF);
        let mut query = builder(session);
        query.where_equals("lastName", "Kara").unwrap();

        assert!(matches!(
            query.where_equals("", 1_i64),
            Err(RepoError::InvalidField(_))
        ));
        assert!(matches!(
            query.paginate(0, 5),
            Err(RepoError::InvalidPagination(_))
        ));
        assert!(matches!(
            query.paginate(5, 0),
            Err(RepoError::InvalidPagination(_))
        ));
        assert_eq!(query.execute().unwrap().len(), 3);
    }
    on_each_backend!(check);
}

#[test]
fn unregistered_entity_cannot_build_queries() {
    let conn = open_db_in_memory().unwrap();
    let session = SqliteSession::new(&conn, EntityRegistry::new());
    assert!(matches!(
        QueryBuilder::<_, Employee>::for_entity(&session),
        Err(RepoError::InvalidEntity(_))
    ));
}

#[test]
fn employee_scenario_end_to_end() {
    fn check<S: PersistenceSession>(session: &S) {
        seed(
            session,
            &[
                ("Ali", "Yılmaz", None, 4500.0),
                ("Ayşe", "Kara", None, 6000.0),
                ("Can", "Demir", None, 4500.0),
            ],
        );
        let repo = SessionRepository::new(session);

        let mut query = repo.query_builder_for::<Employee>().unwrap();
        query.where_equals("lastName", "Kara").unwrap();
        let kara = query.execute().unwrap();
        assert_eq!(kara.len(), 1);
        assert_eq!(kara[0].first_name, "Ayşe");

        let by_salary = repo
            .find_all_sorted::<Employee>("salary", true)
            .unwrap()
            .into_iter()
            .map(|employee| employee.first_name)
            .collect::<Vec<_>>();
        assert_eq!(by_salary, vec!["Ali", "Can", "Ayşe"]);
    }
    on_each_backend!(check);
}
