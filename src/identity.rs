//! DNI-keyed login / registration flow.
//!
//! `EnterIdentifier` → `EnterPassword` (known DNI) → `LoggedIn`, or
//! `EnterIdentifier` → `ChooseRole` (identity looked up) → `CompleteProfile`
//! → `Registered`. Field errors are kept on the flow so the form can be
//! re-rendered with them.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, NoneAsEmptyString};
use std::fmt;
use tracing::{info, warn};

use crate::{
    error::{Error, FieldErrors, Result},
    gateway::IdentityGateway,
    validators,
};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "Estudiante")]
    Student,
    #[serde(rename = "Orientador")]
    Counselor,
}

impl Role {
    pub fn from_tipo(tipo: &str) -> Option<Role> {
        match tipo {
            "Estudiante" => Some(Role::Student),
            "Orientador" => Some(Role::Counselor),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "Estudiante",
            Role::Counselor => "Orientador",
        }
    }

    pub fn home_path(role: Option<Role>) -> &'static str {
        match role {
            Some(Role::Student) => "/estudiante/dashboard",
            Some(Role::Counselor) => "/orientador/dashboard",
            None => "/",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct DomainCheck {
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// National registry lookup result.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct IdentityRecord {
    pub success: bool,
    pub nombres: String,
    pub apellido_paterno: String,
    pub apellido_materno: String,
    pub fecha_nacimiento: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedIdentity {
    pub dni: String,
    pub nombres: String,
    pub apellido_paterno: String,
    pub apellido_materno: String,
    pub fecha_nacimiento: Option<String>,
}

impl VerifiedIdentity {
    pub fn full_name(&self) -> String {
        format!(
            "{} {} {}",
            self.nombres, self.apellido_paterno, self.apellido_materno
        )
        .trim()
        .to_string()
    }

    pub fn last_names(&self) -> String {
        format!("{} {}", self.apellido_paterno, self.apellido_materno)
            .trim()
            .to_string()
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Institution {
    #[serde(rename = "InstiID")]
    pub id: i64,
    #[serde(rename = "InstiNombre")]
    pub nombre: String,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct RoleInfo {
    #[serde(default)]
    pub tipo_usuario: String,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Profile {
    pub user: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub rol: RoleInfo,
}

impl Profile {
    pub fn role(&self) -> Option<Role> {
        Role::from_tipo(&self.rol.tipo_usuario)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CounselorFields {
    pub institucion: String,
    pub cargo: String,
    #[serde(rename = "areaEspecializacion")]
    pub area_especializacion: String,
    #[serde(rename = "perfilProfesional")]
    pub perfil_profesional: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RegisterPayload {
    pub dni: String,
    pub first_name: String,
    pub last_name: String,
    pub nombres: String,
    #[serde(rename = "apellidoPaterno")]
    pub apellido_paterno: String,
    #[serde(rename = "apellidoMaterno")]
    pub apellido_materno: String,
    pub telefono: String,
    #[serde(rename = "fechaNacimiento")]
    pub fecha_nacimiento: String,
    pub email: String,
    pub password: String,
    #[serde(rename = "passwordConfirm")]
    pub password_confirm: String,
    pub rol: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insti_id: Option<i64>,
    #[serde(flatten)]
    pub counselor: Option<CounselorFields>,
}

/// Raw profile form as posted by the browser.
#[serde_as]
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ProfileForm {
    #[serde(default)]
    pub telefono: String,
    #[serde(default)]
    pub fecha_nacimiento: String,
    #[serde(default)]
    pub correo: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub institucion: Option<String>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub cargo: Option<String>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub area_especializacion: Option<String>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub perfil_profesional: Option<String>,
    #[serde(default)]
    pub acepta_terminos: Option<String>,
}

impl ProfileForm {
    pub fn accepted_terms(&self) -> bool {
        self.acepta_terminos
            .as_deref()
            .is_some_and(|v| matches!(v, "on" | "true" | "1"))
    }

    /// Copy that is safe to keep around for re-filling the form.
    pub fn without_passwords(&self) -> ProfileForm {
        ProfileForm {
            password: String::new(),
            password_confirm: String::new(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    EnterIdentifier,
    EnterPassword { dni: String },
    ChooseRole { identity: VerifiedIdentity },
    CompleteProfile { identity: VerifiedIdentity, role: Role },
    LoggedIn { role: Option<Role> },
    Registered { role: Role, message: String },
}

#[derive(Debug, Clone)]
pub struct IdentityFlow {
    step: Step,
    errors: FieldErrors,
    institutions: Vec<Institution>,
    /// last identifier typed, kept so the form can be re-filled
    typed_dni: String,
    /// last rejected profile, passwords blanked
    last_profile: Option<ProfileForm>,
}

impl Default for IdentityFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityFlow {
    pub fn new() -> Self {
        Self {
            step: Step::EnterIdentifier,
            errors: FieldErrors::new(),
            institutions: Vec::new(),
            typed_dni: String::new(),
            last_profile: None,
        }
    }

    pub fn step(&self) -> &Step {
        &self.step
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn institutions(&self) -> &[Institution] {
        &self.institutions
    }

    pub fn typed_dni(&self) -> &str {
        &self.typed_dni
    }

    pub fn last_profile(&self) -> Option<&ProfileForm> {
        self.last_profile.as_ref()
    }

    /// Back to the identifier prompt from any step.
    pub fn change_identifier(&mut self) {
        self.step = Step::EnterIdentifier;
        self.errors.clear();
        self.last_profile = None;
    }

    fn fail(&mut self, field: &'static str, msg: impl Into<String>) -> Error {
        self.errors.insert(field, msg.into());
        Error::Fields(self.errors.clone())
    }

    pub async fn submit_identifier(
        &mut self,
        gateway: &dyn IdentityGateway,
        raw: &str,
    ) -> Result<()> {
        if self.step != Step::EnterIdentifier {
            return Err(Error::InvalidState("identificador ya enviado"));
        }
        self.errors.clear();
        let dni = validators::normalize_dni(raw);
        self.typed_dni = dni.clone();
        if let Err(msg) = validators::validate_dni(&dni) {
            return Err(self.fail("dni", msg));
        }

        let exists = gateway.dni_exists(&dni).await.unwrap_or_else(|e| {
            warn!(error = %e, "dni existence check failed, assuming new account");
            false
        });
        if exists {
            info!("dni already registered, asking for password");
            self.step = Step::EnterPassword { dni };
            return Ok(());
        }

        match gateway.lookup_identity(&dni).await {
            Ok(rec) if rec.success => {
                info!("identity verified, choosing role");
                self.step = Step::ChooseRole {
                    identity: VerifiedIdentity {
                        dni,
                        nombres: rec.nombres,
                        apellido_paterno: rec.apellido_paterno,
                        apellido_materno: rec.apellido_materno,
                        fecha_nacimiento: rec.fecha_nacimiento.filter(|f| !f.is_empty()),
                    },
                };
                Ok(())
            }
            Ok(_) => Err(self.fail("dni", "No se pudo verificar el DNI con RENIEC.")),
            Err(e) => {
                warn!(error = %e, "identity lookup failed");
                Err(self.fail("dni", "Error al verificar el DNI. Intenta de nuevo."))
            }
        }
    }

    /// Logs in with the DNI as username; returns where the user should land.
    pub async fn submit_password(
        &mut self,
        gateway: &dyn IdentityGateway,
        password: &str,
    ) -> Result<&'static str> {
        let Step::EnterPassword { dni } = &self.step else {
            return Err(Error::InvalidState("no se espera contraseña"));
        };
        let dni = dni.clone();
        self.errors.clear();
        if password.is_empty() {
            return Err(self.fail("password", "Ingresa tu contraseña"));
        }

        if let Err(e) = gateway.login(&dni, password).await {
            warn!(error = %e, "login failed");
            let msg = match &e {
                Error::Server { message, .. } => message.clone(),
                other => other.to_string(),
            };
            return Err(self.fail("password", msg));
        }

        let role = match gateway.me().await {
            Ok(p) => p.role(),
            Err(e) => {
                warn!(error = %e, "could not load profile after login");
                None
            }
        };
        info!(role = ?role, "login ok");
        self.step = Step::LoggedIn { role };
        Ok(Role::home_path(role))
    }

    pub async fn choose_role(&mut self, gateway: &dyn IdentityGateway, role: Role) -> Result<()> {
        let Step::ChooseRole { identity } = &self.step else {
            return Err(Error::InvalidState("no se espera rol"));
        };
        let identity = identity.clone();
        self.errors.clear();
        match gateway.list_institutions().await {
            Ok(list) => self.institutions = list,
            Err(e) => warn!(error = %e, "could not load institutions"),
        }
        self.step = Step::CompleteProfile { identity, role };
        Ok(())
    }

    pub async fn submit_profile(
        &mut self,
        gateway: &dyn IdentityGateway,
        form: &ProfileForm,
    ) -> Result<String> {
        let Step::CompleteProfile { identity, role } = &self.step else {
            return Err(Error::InvalidState("no se espera formulario"));
        };
        let (identity, role) = (identity.clone(), *role);
        self.last_profile = Some(form.without_passwords());

        self.errors = validate_profile(role, form, &self.institutions);
        if !self.errors.is_empty() {
            return Err(Error::Fields(self.errors.clone()));
        }

        match gateway.email_exists(form.correo.trim()).await {
            Ok(true) => return Err(self.fail("correo", "Este email ya está registrado")),
            Ok(false) => {}
            Err(e) => warn!(error = %e, "email check failed, letting the backend decide"),
        }

        if role == Role::Counselor {
            match gateway.validate_domain(form.correo.trim()).await {
                Ok(check) if check.valid => {}
                Ok(check) => {
                    let msg = check
                        .message
                        .unwrap_or_else(|| "Dominio no permitido para orientadores".into());
                    return Err(self.fail("correo", msg));
                }
                Err(e) => {
                    warn!(error = %e, "domain validation failed");
                    return Err(self.fail("correo", "Error al validar dominio"));
                }
            }
        }

        let payload = build_payload(&identity, role, form, &self.institutions);
        match gateway.register(&payload).await {
            Ok(_) => {
                let message = match role {
                    Role::Counselor => {
                        "Registro exitoso. Tu cuenta está pendiente de verificación."
                    }
                    Role::Student => "Registro exitoso. Ya puedes iniciar sesión.",
                }
                .to_string();
                info!(role = %role, "registration ok");
                self.last_profile = None;
                self.step = Step::Registered {
                    role,
                    message: message.clone(),
                };
                Ok(message)
            }
            Err(e) => {
                warn!(error = %e, "registration rejected");
                let msg = match &e {
                    Error::Server { message, .. } => message.clone(),
                    other => other.to_string(),
                };
                Err(self.fail("general", msg))
            }
        }
    }
}

fn find_institution<'a>(list: &'a [Institution], name: &str) -> Option<&'a Institution> {
    list.iter().find(|i| i.nombre == name)
}

/// Collects every field problem at once; empty means the form is acceptable.
pub fn validate_profile(
    role: Role,
    form: &ProfileForm,
    institutions: &[Institution],
) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if let Err(m) = validators::validate_phone(form.telefono.trim()) {
        errors.insert("telefono", m.into());
    }
    let birth = form.fecha_nacimiento.trim();
    if birth.is_empty() {
        errors.insert("fecha_nacimiento", "Fecha de nacimiento es obligatoria".into());
    } else if chrono::NaiveDate::parse_from_str(birth, "%Y-%m-%d").is_err() {
        errors.insert("fecha_nacimiento", "Fecha de nacimiento inválida".into());
    }
    if validators::validate_email(form.correo.trim()).is_err() {
        errors.insert("correo", "Email inválido".into());
    }
    if let Err(m) = validators::validate_password(&form.password) {
        errors.insert("password", m.into());
    }
    if form.password != form.password_confirm {
        errors.insert("password_confirm", "Las contraseñas no coinciden".into());
    }

    match (role, form.institucion.as_deref()) {
        (Role::Counselor, None) => {
            errors.insert("institucion", "Selecciona una institución".into());
        }
        (_, Some(name)) if find_institution(institutions, name).is_none() => {
            errors.insert(
                "institucion",
                "Por favor selecciona una institución válida".into(),
            );
        }
        _ => {}
    }

    if role == Role::Counselor {
        if form.cargo.as_deref().map_or(true, |c| c.trim().is_empty()) {
            errors.insert("cargo", "Campo obligatorio".into());
        }
        if form
            .area_especializacion
            .as_deref()
            .map_or(true, |a| a.trim().is_empty())
        {
            errors.insert("area_especializacion", "Campo obligatorio".into());
        }
    }

    if !form.accepted_terms() {
        errors.insert("terminos", "Debes aceptar los términos y condiciones".into());
    }
    errors
}

pub fn build_payload(
    identity: &VerifiedIdentity,
    role: Role,
    form: &ProfileForm,
    institutions: &[Institution],
) -> RegisterPayload {
    let institution = form
        .institucion
        .as_deref()
        .and_then(|n| find_institution(institutions, n));
    let counselor = (role == Role::Counselor).then(|| CounselorFields {
        institucion: institution.map(|i| i.nombre.clone()).unwrap_or_default(),
        cargo: form.cargo.clone().unwrap_or_default(),
        area_especializacion: form.area_especializacion.clone().unwrap_or_default(),
        perfil_profesional: form.perfil_profesional.clone(),
    });

    RegisterPayload {
        dni: identity.dni.clone(),
        first_name: identity.nombres.clone(),
        last_name: identity.last_names(),
        nombres: identity.nombres.clone(),
        apellido_paterno: identity.apellido_paterno.clone(),
        apellido_materno: identity.apellido_materno.clone(),
        telefono: form.telefono.trim().to_string(),
        fecha_nacimiento: form.fecha_nacimiento.trim().to_string(),
        email: form.correo.trim().to_string(),
        password: form.password.clone(),
        password_confirm: form.password_confirm.clone(),
        rol: role,
        insti_id: institution.map(|i| i.id),
        counselor,
    }
}
