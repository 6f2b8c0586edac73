//! Random sample data for demos and tests.
//!
//! Names come from fixed pools; callers inject the RNG so seeded runs are
//! reproducible.

use crate::model::department::Department;
use crate::model::employee::Employee;
use rand::seq::SliceRandom;
use rand::Rng;

pub const FIRST_NAMES: &[&str] = &[
    "Ali", "Ayşe", "Mehmet", "Elif", "Burcu", "Kemal", "Cem", "Hülya", "Hasan", "Can",
];

pub const LAST_NAMES: &[&str] = &[
    "Yılmaz", "Kara", "Demir", "Aydın", "Tekin", "Arslan", "Doğan", "Kurt", "Demirci", "Öztürk",
];

pub const DEPARTMENT_NAMES: &[&str] = &["IT", "HR", "Finance", "Marketing", "Sales"];

const MIN_SALARY: u32 = 4000;
const SALARY_SPREAD: u32 = 5000;
const EMAIL_SUFFIX_BOUND: u32 = 1000;
const EMAIL_DOMAIN: &str = "example.com";

/// Produces transient departments and employees.
pub struct RandomDataGenerator<R: Rng> {
    rng: R,
}

impl<R: Rng> RandomDataGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Department with a name drawn from `DEPARTMENT_NAMES`.
    pub fn random_department(&mut self) -> Department {
        Department::new(pick(&mut self.rng, DEPARTMENT_NAMES))
    }

    /// Employee with a salary in `[4000, 9000)` and an
    /// `first.lastN@example.com` address, lower-cased.
    pub fn random_employee(&mut self) -> Employee {
        let first_name = pick(&mut self.rng, FIRST_NAMES);
        let last_name = pick(&mut self.rng, LAST_NAMES);
        let salary = MIN_SALARY + self.rng.gen_range(0..SALARY_SPREAD);
        let suffix = self.rng.gen_range(0..EMAIL_SUFFIX_BOUND);
        let email = format!("{first_name}.{last_name}{suffix}@{EMAIL_DOMAIN}").to_lowercase();

        Employee::new(first_name, last_name, Some(email), Some(f64::from(salary)))
    }
}

fn pick<R: Rng>(rng: &mut R, pool: &[&'static str]) -> &'static str {
    pool.choose(rng).copied().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{RandomDataGenerator, DEPARTMENT_NAMES, FIRST_NAMES, LAST_NAMES};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn employees_draw_from_pools_within_salary_range() {
        let mut generator = RandomDataGenerator::new(StdRng::seed_from_u64(7));
        for _ in 0..200 {
            let employee = generator.random_employee();
            assert!(FIRST_NAMES.contains(&employee.first_name.as_str()));
            assert!(LAST_NAMES.contains(&employee.last_name.as_str()));
            let salary = employee.salary.unwrap();
            assert!((4000.0..9000.0).contains(&salary));
            assert_eq!(salary.fract(), 0.0);
            assert!(employee.id.is_none());
            assert!(employee.department_id.is_none());
        }
    }

    #[test]
    fn email_is_lower_cased_and_derived_from_name() {
        let mut generator = RandomDataGenerator::new(StdRng::seed_from_u64(42));
        let employee = generator.random_employee();
        let email = employee.email.unwrap();
        let prefix = format!(
            "{}.{}",
            employee.first_name.to_lowercase(),
            employee.last_name.to_lowercase()
        );

        assert_eq!(email, email.to_lowercase());
        assert!(email.starts_with(&prefix));
        assert!(email.ends_with("@example.com"));
        let digits = &email[prefix.len()..email.len() - "@example.com".len()];
        assert!(digits.parse::<u32>().unwrap() < 1000);
    }

    #[test]
    fn seeded_generators_are_reproducible() {
        let mut left = RandomDataGenerator::new(StdRng::seed_from_u64(9));
        let mut right = RandomDataGenerator::new(StdRng::seed_from_u64(9));
        assert_eq!(left.random_employee(), right.random_employee());

        let department = left.random_department();
        assert!(DEPARTMENT_NAMES.contains(&department.name.as_str()));
    }
}
