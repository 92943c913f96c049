// Form field validators and normalizers shared by the auth and authoring flows.

use once_cell::sync::Lazy;
use regex::Regex;

static DNI_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{8}$").expect("static regex"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static regex"));
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^9\d{8}$").expect("static regex"));

pub const MIN_PASSWORD_LEN: usize = 8;

/// Keeps only ASCII digits, the way the identifier input filters keystrokes.
pub fn normalize_dni(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub fn validate_dni(dni: &str) -> Result<(), &'static str> {
    if dni.is_empty() {
        return Err("El DNI es obligatorio");
    }
    if !DNI_RE.is_match(dni) {
        return Err("DNI debe tener 8 dígitos");
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.is_empty() {
        return Err("El email es obligatorio");
    }
    if !EMAIL_RE.is_match(email) {
        return Err("Email inválido");
    }
    Ok(())
}

pub fn validate_phone(phone: &str) -> Result<(), &'static str> {
    if PHONE_RE.is_match(phone) {
        Ok(())
    } else {
        Err("Teléfono debe empezar con 9 y tener 9 dígitos")
    }
}

pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err("La contraseña debe tener al menos 8 caracteres");
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordStrength {
    pub level: u8,
    pub label: &'static str,
}

/// Scores a password on a 0..=4 scale.
pub fn password_strength(password: &str) -> PasswordStrength {
    if password.is_empty() {
        return PasswordStrength { level: 0, label: "" };
    }

    let len = password.chars().count();
    let mut points = 0;
    if len >= 8 {
        points += 1;
    }
    if len >= 12 {
        points += 1;
    }
    if password.chars().any(|c| c.is_ascii_lowercase()) {
        points += 1;
    }
    if password.chars().any(|c| c.is_ascii_uppercase()) {
        points += 1;
    }
    if password.chars().any(|c| c.is_ascii_digit()) {
        points += 1;
    }
    if password.chars().any(|c| !c.is_ascii_alphanumeric()) {
        points += 1;
    }

    let (level, label) = match points {
        0 | 1 => (0, "Muy débil"),
        2 => (1, "Débil"),
        3 | 4 => (2, "Media"),
        5 => (3, "Fuerte"),
        _ => (4, "Muy fuerte"),
    };
    PasswordStrength { level, label }
}
