// SPDX-FileCopyrightText: 2026 Flowershop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Free-text answer validation.
//!
//! Each validator returns the normalized value or a
//! [`FlowerError::Validation`] whose message is the hint shown to the user.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use flowershop_core::FlowerError;
use regex::Regex;

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[А-Яа-яЁёA-Za-z]{2,}$").expect("valid name regex"));

static ADDRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^г\.\s*[А-Яа-яЁё\- ]+,\s*",
        r"(ул\.|улица|просп\.|проспект|пр-т)\s*[А-Яа-яЁё\- ]+,\s*",
        r"(д\.|дом)\s*\d+[А-Яа-я]*(,\s*(кв\.|квартира)\s*\d+)?$",
    ))
    .expect("valid address regex")
});

const ADDRESS_EXAMPLES: &str = "Примеры корректных адресов:\n\
     • г. Москва, ул. Ленина, д. 15\n\
     • г. Санкт-Петербург, улица Марата, дом 25, кв. 10";

fn invalid(field: &'static str, message: impl Into<String>) -> FlowerError {
    FlowerError::Validation {
        field,
        message: message.into(),
    }
}

/// Letters only, at least two of them.
pub fn recipient_name(input: &str) -> Result<String, FlowerError> {
    let name = input.trim();
    if NAME_RE.is_match(name) {
        Ok(name.to_string())
    } else {
        Err(invalid(
            "recipient_name",
            "⚠️ Пожалуйста, введите корректное имя (только буквы, не менее 2 символов).",
        ))
    }
}

/// City, street, and house markers, then the full structural pattern.
pub fn address(input: &str) -> Result<String, FlowerError> {
    let address = input.trim();

    let mut problems = Vec::new();
    if !address.starts_with("г. ") {
        problems.push("Адрес должен начинаться с указания города (г. Москва)");
    }
    if !address.contains("ул.") && !address.contains("улица") {
        problems.push("Укажите улицу (ул. Ленина или улица Ленина)");
    }
    if !address.contains("д.") && !address.contains("дом") {
        problems.push("Укажите номер дома (д. 10 или дом 15)");
    }
    if !problems.is_empty() {
        let lines: Vec<String> = problems.iter().map(|p| format!("- {p}")).collect();
        return Err(invalid(
            "address",
            format!(
                "❌ Обнаружены ошибки:\n{}\n\n{ADDRESS_EXAMPLES}",
                lines.join("\n")
            ),
        ));
    }

    if !ADDRESS_RE.is_match(address) {
        return Err(invalid(
            "address",
            format!("❌ Некорректный формат адреса.\n\n{ADDRESS_EXAMPLES}"),
        ));
    }
    Ok(address.to_string())
}

/// ISO date, not before `today`.
pub fn delivery_date(input: &str, today: NaiveDate) -> Result<NaiveDate, FlowerError> {
    let date = NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| {
        invalid(
            "delivery_date",
            "❌ Неверный формат даты. Используйте ГГГГ-ММ-ДД.",
        )
    })?;
    if date < today {
        return Err(invalid("delivery_date", "❌ Дата не может быть в прошлом!"));
    }
    Ok(date)
}

/// `HH:MM` with hour in 0..24 and minute in 0..60.
pub fn delivery_time(input: &str) -> Result<String, FlowerError> {
    let bad = || {
        invalid(
            "delivery_time",
            "❌ Неверный формат времени. Используйте ЧЧ:ММ (например, 14:00).",
        )
    };
    let time = input.trim();
    let shaped = time.len() == 5
        && time
            .bytes()
            .enumerate()
            .all(|(i, b)| if i == 2 { b == b':' } else { b.is_ascii_digit() });
    if !shaped {
        return Err(bad());
    }
    let hours: u32 = time[0..2].parse().map_err(|_| bad())?;
    let minutes: u32 = time[3..5].parse().map_err(|_| bad())?;
    let parsed = NaiveTime::from_hms_opt(hours, minutes, 0).ok_or_else(bad)?;
    Ok(parsed.format("%H:%M").to_string())
}

/// `+7` or `8` followed by ten digits. Spaces, dashes, and parentheses are
/// ignored. Normalized to `+7XXXXXXXXXX`.
pub fn phone(input: &str) -> Result<String, FlowerError> {
    let compact: String = input
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();
    let digits = compact
        .strip_prefix("+7")
        .or_else(|| compact.strip_prefix('8'));
    match digits {
        Some(rest) if rest.len() == 10 && rest.chars().all(|c| c.is_ascii_digit()) => {
            Ok(format!("+7{rest}"))
        }
        _ => Err(invalid(
            "phone",
            "Номер введён некорректно, введите номер в формате +79161234567 или 89161234567",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(err: FlowerError) -> String {
        match err {
            FlowerError::Validation { message, .. } => message,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn names_are_letters_only() {
        assert_eq!(recipient_name("  Мария ").unwrap(), "Мария");
        assert_eq!(recipient_name("Alёna").unwrap(), "Alёna");
        assert!(recipient_name("Я").is_err());
        assert!(recipient_name("Анна-Мария").is_err());
        assert!(recipient_name("R2D2").is_err());
        assert!(recipient_name("").is_err());
    }

    #[test]
    fn address_accepts_structured_forms() {
        for ok in [
            "г. Москва, ул. Ленина, д. 15",
            "г. Красноярск, улица Мира, дом 3, кв. 7",
            "г. Санкт-Петербург, улица Марата, дом 25, квартира 10",
            "г. Казань, ул. Баумана, д. 12а",
        ] {
            assert!(address(ok).is_ok(), "{ok}");
        }
    }

    #[test]
    fn address_lists_each_missing_marker() {
        let msg = message(address("Москва, Ленина 15").unwrap_err());
        assert!(msg.contains("начинаться с указания города"));
        assert!(msg.contains("Укажите улицу"));
        assert!(msg.contains("Укажите номер дома"));
        assert!(msg.contains("Примеры корректных адресов"));

        let msg = message(address("г. Казань, пр-т Победы, д. 12").unwrap_err());
        assert!(msg.contains("Укажите улицу"));
        assert!(!msg.contains("Укажите номер дома"));
    }

    #[test]
    fn address_with_markers_but_bad_shape_is_rejected() {
        let msg = message(address("г. Москва ул. Ленина д. пятнадцать").unwrap_err());
        assert!(msg.starts_with("❌ Некорректный формат адреса."));
    }

    #[test]
    fn dates_must_not_be_in_the_past() {
        let today = NaiveDate::from_ymd_opt(2030, 6, 15).unwrap();
        assert_eq!(
            delivery_date("2030-06-15", today).unwrap(),
            today,
            "today is allowed"
        );
        assert!(delivery_date("2030-06-16", today).is_ok());
        assert_eq!(
            message(delivery_date("2030-06-14", today).unwrap_err()),
            "❌ Дата не может быть в прошлом!"
        );
        assert!(message(delivery_date("15.06.2030", today).unwrap_err()).contains("ГГГГ-ММ-ДД"));
        assert!(delivery_date("2030-02-30", today).is_err());
    }

    #[test]
    fn times_need_exact_shape_and_ranges() {
        assert_eq!(delivery_time("14:00").unwrap(), "14:00");
        assert_eq!(delivery_time("00:59").unwrap(), "00:59");
        assert_eq!(delivery_time(" 23:05 ").unwrap(), "23:05");
        for bad in [
            "24:00", "12:60", "9:00", "09-00", "0900", "ab:cd", "12:5x", "1:000", "+1:00",
            "12:+5", "-1:00", "1+:00",
        ] {
            assert!(delivery_time(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn phones_are_normalized() {
        assert_eq!(phone("+79161234567").unwrap(), "+79161234567");
        assert_eq!(phone("89161234567").unwrap(), "+79161234567");
        assert_eq!(phone("8 (916) 123-45-67").unwrap(), "+79161234567");
        assert_eq!(phone("+7 916 123 45 67").unwrap(), "+79161234567");
        for bad in ["9161234567", "+7916123456", "+791612345678", "+7916abc4567", "+8 916 123 45 67"] {
            assert!(phone(bad).is_err(), "{bad}");
        }
    }
}
