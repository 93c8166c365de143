//! Reply texts.

use crate::catalog::Course;
use crate::quiz::QUESTION_BANK;
use crate::store::{ConversationTurn, Enrollment, Role};

pub const WELCOME: &str = "Здравствуйте! Я помогу подобрать курс программирования. Как вас зовут?";

pub const GREETING: &str = "Привет! Напишите 'Выбрать курс' чтобы выбрать курс.";

pub const SMALL_TALK: &str = "У меня все хорошо! Готов помочь выбрать курс. Напишите 'Выбрать курс'.";

pub const QUIZ_INTRO: &str = "Спасибо! Теперь пройдите короткий тест, чтобы мы подобрали подходящий уровень.";

pub const QUIZ_RETRY: &str = "Пожалуйста, ответьте номером варианта от 1 до 4.";

pub const INVALID_COURSE_NUMBER: &str =
    "Неверный номер курса. Пожалуйста, выберите курс по номеру.";

pub const CONFIRM_RETRY: &str =
    "Пожалуйста, напишите 'Да' если вы оплатили, или 'Нет' если еще не оплатили.";

pub const PAYMENT_ACCEPTED: &str = "Отлично! Ваш платеж был успешно принят. Спасибо за оплату!";

pub const PAYMENT_DECLINED: &str =
    "Хорошо, подумайте еще. Напишите 'Выбрать курс', чтобы изменить выбор.";

pub const NO_COURSE_SELECTED: &str =
    "Курс не выбран. Напишите 'Выбрать курс', чтобы выбрать курс.";

pub const RESTART_SELECTION: &str = "Напишите 'Выбрать курс' для начала.";

pub const READ_FAILED: &str = "Извините, не удалось получить данные. Попробуйте позже.";

pub const ASK_USAGE: &str = "Напишите вопрос после команды, например: /ask Есть ли скидки?";

pub const ASK_ACCEPTED: &str = "Спасибо! Ваш вопрос передан преподавателям.";

pub const ASK_FAILED: &str = "Извините, не удалось сохранить вопрос. Попробуйте позже.";

pub fn ask_phone(name: &str) -> String {
    format!("Приятно познакомиться, {name}! Укажите, пожалуйста, ваш номер телефона.")
}

pub fn course_selected(course: &Course) -> String {
    format!(
        "Вы выбрали курс: {}.\nЦена: {}₽\nХотите оплатить? Напишите 'Да' или 'Нет'.",
        course.name,
        course.price_display()
    )
}

/// `/history` listing, oldest first.
pub fn history(turns: &[ConversationTurn]) -> String {
    if turns.is_empty() {
        return "История сообщений пуста.".to_string();
    }
    let mut out = String::from("История сообщений:\n\n");
    for turn in turns {
        let who = match turn.role {
            Role::User => "Вы",
            Role::Bot => "Бот",
        };
        out.push_str(&format!(
            "[{}] {who}: {}\n",
            turn.created_at.format("%Y-%m-%d %H:%M"),
            turn.text
        ));
    }
    out.trim_end().to_string()
}

/// `/enrollments` listing for one user.
pub fn enrollments(records: &[&Enrollment]) -> String {
    if records.is_empty() {
        return "У вас пока нет записей на курсы.".to_string();
    }
    let mut out = String::from("Ваши записи на курсы:\n\n");
    for e in records {
        let status = if e.paid { "оплачено" } else { "не оплачено" };
        out.push_str(&format!(
            "[{}] {} — {status} (тест: {}/{})\n",
            e.created_at.format("%Y-%m-%d %H:%M"),
            e.course_name,
            e.quiz_score,
            QUESTION_BANK.len()
        ));
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn course_selected_shows_two_decimal_price() {
        let course = Course::new("Go Basics", "Beginner", "T", "S", "D", dec!(9900));
        let text = course_selected(&course);
        assert!(text.contains("Go Basics"));
        assert!(text.contains("9900.00₽"));
        assert!(text.contains("'Да' или 'Нет'"));
    }

    #[test]
    fn history_marks_roles() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 10, 30, 0).unwrap();
        let turns = vec![
            ConversationTurn {
                user_id: 1,
                role: Role::User,
                text: "Привет".into(),
                created_at: at,
            },
            ConversationTurn {
                user_id: 1,
                role: Role::Bot,
                text: "Здравствуйте".into(),
                created_at: at,
            },
        ];
        let text = history(&turns);
        assert!(text.contains("[2026-03-01 10:30] Вы: Привет"));
        assert!(text.ends_with("Бот: Здравствуйте"));
    }

    #[test]
    fn empty_listings() {
        assert_eq!(history(&[]), "История сообщений пуста.");
        assert_eq!(enrollments(&[]), "У вас пока нет записей на курсы.");
    }

    #[test]
    fn enrollment_status_and_score() {
        let record = Enrollment {
            user_id: 1,
            name: "Ann".into(),
            phone: "555".into(),
            course_name: "Go Basics".into(),
            paid: false,
            quiz_score: 3,
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 10, 30, 0).unwrap(),
        };
        let text = enrollments(&[&record]);
        assert!(text.contains("Go Basics — не оплачено (тест: 3/10)"));
    }
}
