//! Course catalog — read-only list of offerings loaded once at startup.
//!
//! The catalog is immutable after load and shared by cloning the handle, so
//! readers never need a lock. Order is the store's insertion order and is
//! stable for the lifetime of the process; selection numbers are 1-based
//! positions in that order.

pub mod model;

use std::sync::Arc;

use rust_decimal_macros::dec;

pub use model::Course;

use crate::error::DatabaseError;
use crate::store::Database;

/// Shown when a listing is requested but the catalog is empty.
const EMPTY_CATALOG: &str = "Курсов пока нет.";

/// Courses seeded into an empty store on first start.
pub fn default_courses() -> Vec<Course> {
    vec![
        Course::new(
            "Go для начинающих",
            "Начальный",
            "Иван Иванов",
            "Понедельно, 18:00-20:00",
            "Основы языка Go. Изучение синтаксиса и базовых структур данных.",
            dec!(9900),
        ),
        Course::new(
            "Go для продвинутых",
            "Продвинутый",
            "Алексей Петров",
            "Вторник и четверг, 19:00-21:00",
            "Продвинутые техники работы с Go, асинхронное программирование, паттерны проектирования.",
            dec!(14900),
        ),
        Course::new(
            "Python для начинающих",
            "Начальный",
            "Мария Сидорова",
            "Среда, 17:00-19:00",
            "Основы Python. Создание простых программ и работа с библиотеками.",
            dec!(8900),
        ),
    ]
}

/// Immutable, cheaply cloneable course list.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    courses: Arc<[Course]>,
}

impl Catalog {
    pub fn new(courses: Vec<Course>) -> Self {
        Self {
            courses: courses.into(),
        }
    }

    /// Load the catalog from the store.
    pub async fn load(db: &dyn Database) -> Result<Self, DatabaseError> {
        let courses = db.list_courses().await?;
        tracing::info!(courses = courses.len(), "Catalog loaded");
        Ok(Self::new(courses))
    }

    /// All courses in stable order.
    pub fn list_courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    /// Look up a course by its 1-based position. `0` and out-of-range
    /// positions yield `None`.
    pub fn get(&self, number: usize) -> Option<&Course> {
        number.checked_sub(1).and_then(|i| self.courses.get(i))
    }

    /// Look up a course by name (its identity).
    pub fn find(&self, name: &str) -> Option<&Course> {
        self.courses.iter().find(|c| c.name == name)
    }

    /// Numbered listing with every field, used when the user starts selecting.
    pub fn render_selection(&self) -> String {
        if self.is_empty() {
            return EMPTY_CATALOG.to_string();
        }
        let mut out = String::from("Выберите курс:\n\n");
        for (i, course) in self.courses.iter().enumerate() {
            out.push_str(&format!(
                "{}) {}\nУровень: {}\nПреподаватель: {}\nВремя: {}\nОписание: {}\nЦена: {}₽\n\n",
                i + 1,
                course.name,
                course.level,
                course.teacher,
                course.schedule,
                course.description,
                course.price_display(),
            ));
        }
        out.push_str("Отправьте номер курса для выбора.");
        out
    }

    /// `/courses` listing.
    pub fn render_overview(&self) -> String {
        if self.is_empty() {
            return EMPTY_CATALOG.to_string();
        }
        let mut out = String::from("Доступные курсы:\n\n");
        for course in self.courses.iter() {
            out.push_str(&format!(
                "Название: {}\nУровень: {}\nПреподаватель: {}\nВремя: {}\nОписание: {}\nЦена: {}₽\n\n",
                course.name,
                course.level,
                course.teacher,
                course.schedule,
                course.description,
                course.price_display(),
            ));
        }
        out.trim_end().to_string()
    }

    /// `/teachers` listing.
    pub fn render_teachers(&self) -> String {
        if self.is_empty() {
            return EMPTY_CATALOG.to_string();
        }
        let mut out = String::from("Преподаватели:\n\n");
        for course in self.courses.iter() {
            out.push_str(&format!("Преподаватель: {} — {}\n", course.teacher, course.name));
        }
        out.trim_end().to_string()
    }

    /// `/schedule` listing.
    pub fn render_schedule(&self) -> String {
        if self.is_empty() {
            return EMPTY_CATALOG.to_string();
        }
        let mut out = String::from("Расписание курсов:\n\n");
        for course in self.courses.iter() {
            out.push_str(&format!("Курс: {} — Время: {}\n", course.name, course.schedule));
        }
        out.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LibSqlBackend;

    fn sample() -> Catalog {
        Catalog::new(vec![
            Course::new("Go Basics", "Beginner", "Ann", "Mon 18:00", "Syntax", dec!(9900)),
            Course::new("Go Pro", "Advanced", "Bob", "Tue 19:00", "Patterns", dec!(14900)),
        ])
    }

    #[test]
    fn get_is_one_based() {
        let catalog = sample();
        assert!(catalog.get(0).is_none());
        assert_eq!(catalog.get(1).unwrap().name, "Go Basics");
        assert_eq!(catalog.get(2).unwrap().name, "Go Pro");
        assert!(catalog.get(3).is_none());
    }

    #[test]
    fn find_by_name() {
        let catalog = sample();
        assert_eq!(catalog.find("Go Pro").unwrap().teacher, "Bob");
        assert!(catalog.find("go pro").is_none());
    }

    #[test]
    fn selection_listing_is_numbered_with_prices() {
        let text = sample().render_selection();
        assert!(text.starts_with("Выберите курс:"));
        assert!(text.contains("1) Go Basics"));
        assert!(text.contains("2) Go Pro"));
        assert!(text.contains("Цена: 9900.00₽"));
        assert!(text.ends_with("Отправьте номер курса для выбора."));
    }

    #[test]
    fn teacher_and_schedule_listings() {
        let catalog = sample();
        assert!(catalog.render_teachers().contains("Преподаватель: Bob — Go Pro"));
        assert!(
            catalog
                .render_schedule()
                .contains("Курс: Go Basics — Время: Mon 18:00")
        );
    }

    #[test]
    fn overview_is_deterministic() {
        let catalog = sample();
        assert_eq!(catalog.render_overview(), catalog.render_overview());
    }

    #[test]
    fn empty_catalog_renders_placeholder() {
        let catalog = Catalog::default();
        assert_eq!(catalog.render_selection(), EMPTY_CATALOG);
        assert_eq!(catalog.render_overview(), EMPTY_CATALOG);
    }

    #[test]
    fn default_courses_cover_beginner_and_advanced() {
        let courses = default_courses();
        assert_eq!(courses.len(), 3);
        assert_eq!(crate::quiz::Tier::Beginner.recommend(&courses).len(), 2);
        assert_eq!(crate::quiz::Tier::Advanced.recommend(&courses).len(), 1);
        assert_eq!(courses[0].price_display(), "9900.00");
    }

    #[tokio::test]
    async fn load_reads_seeded_courses_in_order() {
        let db = LibSqlBackend::new_memory().await.unwrap();
        db.seed_courses(sample().list_courses()).await.unwrap();

        let catalog = Catalog::load(&db).await.unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(1).unwrap().name, "Go Basics");
        assert_eq!(catalog.get(2).unwrap().price, dec!(14900));
    }
}
