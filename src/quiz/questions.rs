//! The question bank.

use super::OPTIONS_PER_QUESTION;

/// One multiple-choice question. `answer` is the 0-based correct option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizQuestion {
    pub question: &'static str,
    pub options: [&'static str; OPTIONS_PER_QUESTION],
    pub answer: usize,
}

impl QuizQuestion {
    pub fn is_correct(&self, choice: usize) -> bool {
        choice == self.answer
    }
}

/// Questions in presentation order.
pub static QUESTION_BANK: &[QuizQuestion] = &[
    QuizQuestion {
        question: "Что такое переменная в программировании?",
        options: ["Константа", "Указатель", "Область памяти с именем", "Цикл"],
        answer: 2,
    },
    QuizQuestion {
        question: "Какой тип данных используется для целых чисел в Go?",
        options: ["float", "string", "bool", "int"],
        answer: 3,
    },
    QuizQuestion {
        question: "Какой символ используется для начала комментария в Go?",
        options: ["//", "#", "--", "/*"],
        answer: 0,
    },
    QuizQuestion {
        question: "Как объявить функцию в Go?",
        options: ["def", "function", "func", "fn"],
        answer: 2,
    },
    QuizQuestion {
        question: "Какое ключевое слово используется для условного оператора?",
        options: ["case", "for", "switch", "if"],
        answer: 3,
    },
    QuizQuestion {
        question: "Как создать срез в Go?",
        options: ["array()", "[]", "slice{}", "{}"],
        answer: 1,
    },
    QuizQuestion {
        question: "Что такое goroutine?",
        options: ["Тип данных", "Функция", "Отдельный поток выполнения", "Модуль"],
        answer: 2,
    },
    QuizQuestion {
        question: "Как записать цикл с 5 итерациями?",
        options: ["repeat 5", "for i := 0; i < 5; i++", "loop 5", "foreach 5"],
        answer: 1,
    },
    QuizQuestion {
        question: "Какой оператор используется для присваивания?",
        options: ["==", "->", "=", ":="],
        answer: 2,
    },
    QuizQuestion {
        question: "Как обозначается пакет в начале файла Go?",
        options: ["import", "package", "main", "module"],
        answer: 1,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bank_has_ten_well_formed_questions() {
        assert_eq!(QUESTION_BANK.len(), 10);
        for q in QUESTION_BANK {
            assert!(q.answer < OPTIONS_PER_QUESTION, "{}", q.question);
            assert!(q.options.iter().all(|o| !o.is_empty()));
        }
    }
}
