//! Read-only safety check for generated SQL.
//!
//! Classification is statement-prefix and keyword based, not a full dialect
//! parser. Statements are split on bare `;` after comment stripping; semicolons
//! inside string literals are not accounted for. This is an accepted
//! approximation.

/// Outcome of the safety check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Safe,
    Blocked { reason: String },
}

impl ValidationOutcome {
    pub fn is_safe(&self) -> bool {
        matches!(self, ValidationOutcome::Safe)
    }
}

/// Mutating/DDL statement-leading keywords and their user-facing rejection
/// reasons. Checked before the SELECT/WITH prefix rule so the reason names the
/// offending keyword.
const DENYLIST: &[(&str, &str)] = &[
    ("DROP", "Запрос DROP запрещён: удаление таблиц и баз данных недоступно"),
    ("DELETE", "Запрос DELETE запрещён: удаление данных недоступно"),
    ("INSERT", "Запрос INSERT запрещён: добавление данных недоступно"),
    ("UPDATE", "Запрос UPDATE запрещён: изменение данных недоступно"),
    ("ALTER", "Запрос ALTER запрещён: изменение структуры таблиц недоступно"),
    (
        "CREATE",
        "Запрос CREATE запрещён: создание объектов базы данных недоступно",
    ),
    ("TRUNCATE", "Запрос TRUNCATE запрещён: очистка таблиц недоступна"),
    ("EXECUTE", "Запрос EXECUTE запрещён: выполнение процедур недоступно"),
    ("EXEC", "Запрос EXEC запрещён: выполнение процедур недоступно"),
];

/// Classify a candidate SQL string. Pure function, no side effects.
///
/// Empty input (after comment stripping) is Safe; the caller treats it as
/// "no query", not as a violation.
pub fn validate(sql: &str) -> ValidationOutcome {
    let stripped = strip_comments(sql);

    for statement in stripped.split(';') {
        let statement = statement.trim();
        if statement.is_empty() {
            continue;
        }

        let keyword = leading_keyword(statement);

        for (denied, reason) in DENYLIST {
            if keyword == *denied {
                return ValidationOutcome::Blocked {
                    reason: (*reason).to_string(),
                };
            }
        }

        if keyword != "SELECT" && keyword != "WITH" {
            return ValidationOutcome::Blocked {
                reason: "Разрешены только запросы на чтение (SELECT или WITH)".to_string(),
            };
        }
    }

    ValidationOutcome::Safe
}

/// First token of a statement, uppercased. The unit of safety classification.
fn leading_keyword(statement: &str) -> String {
    statement
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_uppercase()
}

/// Strip block (`/* */`) and line (`--`) comments. String literals are not
/// tracked, matching the statement-splitting approximation above.
fn strip_comments(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            '-' if chars.peek() == Some(&'-') => {
                chars.next();
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            _ => out.push(c),
        }
    }

    out.trim().to_string()
}
