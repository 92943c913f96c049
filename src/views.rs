//! Server-rendered HTML pages.

use axum::response::Html;
use std::fmt::Write;

use crate::{
    counselor::{
        ActiveFilter, CounselorDashboard, CounselorQuestionnaire, CATEGORIES, MAX_QUESTION_ROWS,
    },
    error::FieldErrors,
    identity::{IdentityFlow, ProfileForm, Role, Step},
    models::*,
    questionnaire::{Phase, Progress},
    validators,
};

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
  <meta charset="utf-8"/>
  <meta name="viewport" content="width=device-width, initial-scale=1"/>
  <title>{title} · VocaRed</title>
  <link rel="stylesheet" href="/static/app.css"/>
</head>
<body>
<main class="container">
{body}
</main>
</body>
</html>"#,
        title = escape(title),
        body = body
    ))
}

fn flash_box(flash: Option<&str>) -> String {
    flash
        .map(|m| format!(r#"<div class="alert">{}</div>"#, escape(m)))
        .unwrap_or_default()
}

fn field_error(errors: &FieldErrors, field: &str) -> String {
    errors
        .get(field)
        .map(|m| format!(r#"<span class="error-text">{}</span>"#, escape(m)))
        .unwrap_or_default()
}

pub fn error_page(message: &str, back: &str) -> Html<String> {
    layout(
        "Error",
        &format!(
            r#"<div class="error-state"><h2>Error</h2><p>{}</p>
  <a class="btn-secondary" href="{}">Volver</a>
</div>"#,
            escape(message),
            escape(back)
        ),
    )
}

pub fn identity_page(flow: &IdentityFlow, flash: Option<&str>) -> Html<String> {
    let errors = flow.errors();
    let mut body = flash_box(flash);
    if let Some(general) = errors.get("general") {
        body.push_str(&flash_box(Some(general)));
    }

    match flow.step() {
        Step::EnterIdentifier | Step::LoggedIn { .. } | Step::Registered { .. } => {
            let _ = write!(
                body,
                r#"<h2>Continuar con DNI</h2>
<form method="post" action="/auth/dni">
  <label>Número de DNI
    <input name="dni" value="{dni}" maxlength="8" inputmode="numeric"
      placeholder="12345678" autofocus/>
  </label>
  {err}
  <button class="btn-primary" type="submit">Continuar</button>
</form>
<p class="info-box">Si ya tienes cuenta, te pediremos tu contraseña.
  Si no, te ayudaremos a registrarte.</p>"#,
                dni = escape(flow.typed_dni()),
                err = field_error(errors, "dni"),
            );
        }
        Step::EnterPassword { dni } => {
            let _ = write!(
                body,
                r#"<h2>Iniciar Sesión</h2>
<p class="modal-subtitle">DNI {dni} encontrado, ingresa tu contraseña</p>
<form method="post" action="/auth/password">
  <input type="password" name="password" placeholder="Contraseña" autofocus/>
  {err}
  <button class="btn-primary" type="submit">Iniciar Sesión</button>
</form>
<form method="post" action="/auth/cambiar-dni">
  <button class="btn-secondary">← Cambiar DNI</button>
</form>"#,
                dni = escape(dni),
                err = field_error(errors, "password"),
            );
        }
        Step::ChooseRole { identity } => {
            let _ = write!(
                body,
                r#"<h2>Crear Cuenta</h2>
<div class="dni-verified-info"><strong>DNI Verificado: {dni}</strong><p>{name}</p></div>
<h3>¿Cómo te vas a registrar?</h3>
<div class="rol-cards">
  <form method="post" action="/auth/rol"><input type="hidden" name="rol" value="Estudiante"/>
    <button class="rol-card"><h4>Estudiante</h4><p>Busco orientación vocacional</p></button></form>
  <form method="post" action="/auth/rol"><input type="hidden" name="rol" value="Orientador"/>
    <button class="rol-card">
      <h4>Orientador/Docente</h4><p>Soy profesional de la educación</p>
    </button></form>
</div>
<form method="post" action="/auth/cambiar-dni">
  <button class="btn-secondary">Cambiar DNI</button>
</form>"#,
                dni = escape(&identity.dni),
                name = escape(&identity.full_name()),
            );
        }
        Step::CompleteProfile { identity, role } => {
            body.push_str(&profile_form(flow, identity.full_name(), *role, errors));
        }
    }
    layout("Acceso", &body)
}

fn profile_form(flow: &IdentityFlow, name: String, role: Role, errors: &FieldErrors) -> String {
    let blank = ProfileForm::default();
    let prev = flow.last_profile().unwrap_or(&blank);
    let chosen = prev.institucion.as_deref();
    let options: String = flow
        .institutions()
        .iter()
        .map(|i| {
            let selected = if chosen == Some(i.nombre.as_str()) { " selected" } else { "" };
            format!(r#"<option value="{0}"{1}>{0}</option>"#, escape(&i.nombre), selected)
        })
        .collect();
    let institution_label = if role == Role::Counselor {
        "Selecciona tu institución *"
    } else {
        "Institución (opcional)"
    };
    let email_label = if role == Role::Counselor {
        "Email institucional *"
    } else {
        "Email *"
    };
    let opt = |v: &Option<String>| escape(v.as_deref().unwrap_or(""));

    let counselor_fields = if role == Role::Counselor {
        format!(
            r#"<input name="cargo" value="{cargo}" placeholder="Cargo *"/>{e_cargo}
<input name="area_especializacion" value="{area}" placeholder="Área de Especialización *"/>{e_area}
<input name="perfil_profesional" value="{perfil}"
  placeholder="Perfil Profesional (LinkedIn, etc.)"/>"#,
            cargo = opt(&prev.cargo),
            area = opt(&prev.area_especializacion),
            perfil = opt(&prev.perfil_profesional),
            e_cargo = field_error(errors, "cargo"),
            e_area = field_error(errors, "area_especializacion"),
        )
    } else {
        String::new()
    };

    format!(
        r#"<h2>Completar Registro</h2>
<p class="modal-subtitle">Completa tu perfil como {role}</p>
<div class="dni-info-compact"><strong>{name}</strong> <span class="badge">{role}</span></div>
<form method="post" action="/auth/registro" class="register-form">
  <input name="telefono" value="{tel}" maxlength="9" placeholder="Teléfono (9 dígitos) *"/>{e_tel}
  <input type="date" name="fecha_nacimiento" value="{fecha}"/>{e_fecha}
  <select name="institucion">
    <option value="">{institution_label}</option>{options}
  </select>{e_inst}
  <input type="email" name="correo" value="{correo}" placeholder="{email_label}"/>{e_mail}
  {counselor_fields}
  <input type="password" name="password" id="password" placeholder="Contraseña *"/>{e_pw}
  <div id="strength"></div>
  <small>Mínimo {min} caracteres</small>
  <input type="password" name="password_confirm" placeholder="Confirmar contraseña *"/>{e_pw2}
  <label>
    <input type="checkbox" name="acepta_terminos"{terms}/> Acepto los términos y condiciones
  </label>{e_terms}
  <button class="btn-primary" type="submit">Registrarme</button>
</form>
<form method="post" action="/auth/cambiar-dni">
  <button class="btn-secondary">Cambiar DNI</button>
</form>
<script>
(function(){{
  const input = document.getElementById('password');
  const meter = document.getElementById('strength');
  input.addEventListener('input', async () => {{
    const res = await fetch('/auth/fortaleza', {{
      method: 'POST',
      headers: {{'content-type': 'application/x-www-form-urlencoded'}},
      body: new URLSearchParams({{password: input.value}})
    }});
    meter.innerHTML = await res.text();
  }});
}})();
</script>"#,
        role = role,
        name = escape(&name),
        tel = escape(&prev.telefono),
        fecha = escape(&prev.fecha_nacimiento),
        correo = escape(&prev.correo),
        terms = if prev.accepted_terms() { " checked" } else { "" },
        e_tel = field_error(errors, "telefono"),
        e_fecha = field_error(errors, "fecha_nacimiento"),
        e_inst = field_error(errors, "institucion"),
        e_mail = field_error(errors, "correo"),
        e_pw = field_error(errors, "password"),
        e_pw2 = field_error(errors, "password_confirm"),
        e_terms = field_error(errors, "terminos"),
        min = validators::MIN_PASSWORD_LEN,
    )
}

/// Password meter fragment, used where the form is re-rendered with a value.
pub fn strength_meter(password: &str) -> String {
    let s = validators::password_strength(password);
    format!(
        r#"<div class="strength level-{}">{}</div>"#,
        s.level,
        escape(s.label)
    )
}

pub fn student_dashboard(
    summary: &DashboardSummary,
    questionnaires: &[QuestionnaireSummary],
    results: &[ResultSummary],
    flash: Option<&str>,
) -> Html<String> {
    let mut body = flash_box(flash);
    let _ = write!(
        body,
        r#"<header class="dash-header"><h1>Mi orientación vocacional</h1>
<form method="post" action="/auth/salir">
  <button class="btn-secondary">Cerrar sesión</button>
</form></header>
<div class="stats-grid">
  <div class="stat-card"><h3>{disp}</h3><p>Cuestionarios disponibles</p></div>
  <div class="stat-card"><h3>{comp}</h3><p>Completados</p></div>
  <div class="stat-card"><h3>{recs}</h3><p>Recomendaciones activas</p></div>
  <div class="stat-card"><h3>{prog}%</h3><p>Progreso</p></div>
</div>"#,
        disp = summary.cuestionarios_disponibles,
        comp = summary.cuestionarios_completados,
        recs = summary.recomendaciones_activas,
        prog = summary.progreso,
    );
    if let Some(last) = &summary.ultima_evaluacion {
        let _ = write!(
            body,
            r#"<p>Última evaluación: <strong>{}</strong> {}</p>"#,
            escape(last),
            escape(summary.fecha_ultima_evaluacion.as_deref().unwrap_or(""))
        );
    }

    body.push_str("<h2>Cuestionarios</h2>");
    if questionnaires.is_empty() {
        body.push_str("<p class=\"muted\">No hay cuestionarios disponibles.</p>");
    }
    for q in questionnaires {
        let action = if q.completado {
            format!(
                r#"<form method="post" action="/estudiante/cuestionarios/{id}/retomar">
  <input name="razon" placeholder="¿Por qué quieres volver a darlo?"/>
  <button class="btn-secondary">Volver a dar</button></form>"#,
                id = q.id
            )
        } else {
            format!(
                r#"<form method="post" action="/estudiante/cuestionarios/{id}/iniciar">
  <button class="btn-primary">Comenzar</button></form>"#,
                id = q.id
            )
        };
        let _ = write!(
            body,
            r#"<div class="cuestionario-card"><h3>{title}</h3><p>{desc}</p>
  <p class="muted">{n} preguntas · {dur}</p>{action}
</div>"#,
            title = escape(&q.titulo),
            desc = escape(q.descripcion.as_deref().unwrap_or("")),
            n = q.preguntas.unwrap_or(0),
            dur = escape(q.duracion.as_deref().unwrap_or("")),
        );
    }

    body.push_str("<h2>Mis resultados</h2>");
    if results.is_empty() {
        body.push_str("<p class=\"muted\">Aún no tienes resultados.</p>");
    }
    for r in results {
        let _ = write!(
            body,
            r#"<div class="resultado-card">
  <a href="/estudiante/resultado/{id}">{test}</a> <span>{fecha}</span> <span>{score}</span>
</div>"#,
            id = r.id,
            test = escape(r.test.as_deref().unwrap_or("Cuestionario")),
            fecha = escape(r.fecha.as_deref().unwrap_or("")),
            score = r.score.map(|s| format!("{s:.0}%")).unwrap_or_default(),
        );
    }
    layout("Panel del estudiante", &body)
}

/// What the attempt page needs, copied out of the controller under its lock.
pub struct AttemptView<'a> {
    pub questionnaire: &'a Questionnaire,
    pub question: &'a Question,
    pub index: usize,
    pub selected: Option<OptionId>,
    pub progress: Progress,
    pub phase: &'a Phase,
    pub notice: Option<String>,
}

pub fn attempt_page(v: &AttemptView<'_>) -> Html<String> {
    let total = v.questionnaire.preguntas.len();
    let mut body = format!(
        r#"<div class="cuestionario-header">
  <a class="btn-back" href="/estudiante/dashboard">← Volver</a>
  <h1>{name}</h1><span>Pregunta {pos} de {total}</span>
</div>
<div class="progreso-bar">
  <div class="progreso-info"><span>{answered} de {total} respondidas</span><span>{pct}%</span></div>
  <div class="progreso-fill-container"><div class="progreso-fill" style="width: {pct}%"></div></div>
</div>"#,
        name = escape(&v.questionnaire.nombre),
        pos = v.index + 1,
        total = total,
        answered = v.progress.answered,
        pct = v.progress.percent,
    );
    body.push_str(&flash_box(v.notice.as_deref()));

    let _ = write!(
        body,
        r#"<div class="pregunta-card">
  <div class="pregunta-header">
    <span class="pregunta-categoria">{cat}</span>
    <span class="pregunta-numero">Pregunta {orden}</span>
  </div>
  <h2 class="pregunta-texto">{texto}</h2>
  <div class="opciones-container">"#,
        cat = escape(&v.question.categoria),
        orden = v.question.orden,
        texto = escape(&v.question.texto),
    );
    for o in &v.question.opciones {
        let selected = if v.selected == Some(o.id) { " selected" } else { "" };
        let _ = write!(
            body,
            r#"<form method="post" action="/estudiante/intento/responder">
  <input type="hidden" name="pregunta_id" value="{q}"/>
  <input type="hidden" name="opcion_id" value="{o}"/>
  <button class="opcion-button{selected}">{texto}</button></form>"#,
            q = v.question.id,
            o = o.id,
            texto = escape(&o.texto),
        );
    }
    body.push_str("</div></div>");

    let prev_disabled = if v.index == 0 { " disabled" } else { "" };
    let last = v.index + 1 >= total;
    let forward = if last {
        let disabled = if v.progress.missing > 0 { " disabled" } else { "" };
        format!(
            r#"<form method="post" action="/estudiante/intento/finalizar">
    <button class="btn-finalizar"{disabled}>Finalizar</button></form>"#
        )
    } else {
        r#"<form method="post" action="/estudiante/intento/navegar">
    <input type="hidden" name="direccion" value="siguiente"/>
    <button class="btn-nav primary">Siguiente →</button></form>"#
            .to_string()
    };
    let _ = write!(
        body,
        r#"<div class="cuestionario-footer">
  <form method="post" action="/estudiante/intento/navegar">
    <input type="hidden" name="direccion" value="anterior"/>
    <button class="btn-nav"{prev_disabled}>← Anterior</button></form>
  <form method="post" action="/estudiante/intento/guardar">
    <button class="btn-guardar">Guardar Progreso</button></form>
  {forward}
</div>"#,
    );

    if *v.phase == Phase::Confirming {
        let _ = write!(
            body,
            r#"<div class="modal-overlay"><div class="modal-content">
  <h3>¿Finalizar cuestionario?</h3>
  <p>Has respondido {answered} de {total} preguntas.
    Una vez finalizado, no podrás modificar tus respuestas.</p>
  <div class="modal-actions">
    <form method="post" action="/estudiante/intento/cancelar">
      <button class="btn-secondary">Cancelar</button></form>
    <form method="post" action="/estudiante/intento/confirmar">
      <button class="btn-primary">Sí, finalizar</button></form>
  </div>
</div></div>"#,
            answered = v.progress.answered,
            total = total,
        );
    }
    layout(&v.questionnaire.nombre, &body)
}

pub fn loading_page() -> Html<String> {
    layout(
        "Cargando",
        r#"<div class="loading-state"><p>Cargando cuestionario...</p>
  <a href="/estudiante/intento">Actualizar</a>
</div>"#,
    )
}

pub fn results_page(attempt_id: AttemptId, detail: &ResultDetail) -> Html<String> {
    let mut body = format!(
        r#"<a class="btn-back" href="/estudiante/dashboard">← Volver al panel</a>
<h1>Resultados: {name}</h1>
<p class="muted">Intento #{attempt_id} · {fecha} · {n} respuestas</p>"#,
        name = escape(&detail.cuestionario),
        fecha = escape(detail.fecha.as_deref().unwrap_or("")),
        n = detail.total_respuestas,
    );
    if detail.recomendaciones.is_empty() {
        body.push_str("<p>Tus recomendaciones aún se están generando.</p>");
    }
    for r in &detail.recomendaciones {
        let _ = write!(
            body,
            r#"<div class="recomendacion-card">
  <div class="rec-header"><h3>{carrera}</h3><span class="nivel">{nivel}</span></div>
  <div class="score-bar"><div class="score-fill" style="width: {pct}%"></div></div>
  <strong>{score:.0}%</strong>
  <p>{desc}</p>
</div>"#,
            carrera = escape(&r.carrera),
            nivel = escape(&r.nivel),
            pct = r.score.clamp(0.0, 100.0),
            score = r.score,
            desc = escape(&r.descripcion),
        );
    }
    layout("Resultados", &body)
}

fn version_label(v: Option<&serde_json::Value>) -> String {
    match v {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// `rows` is how many blank question slots the authoring form offers.
pub fn counselor_page(
    dash: &CounselorDashboard,
    listing: &[&CounselorQuestionnaire],
    search: &str,
    filter: ActiveFilter,
    rows: usize,
    flash: Option<&str>,
) -> Html<String> {
    let st = &dash.estadisticas;
    let mut body = flash_box(flash);
    let _ = write!(
        body,
        r#"<header class="dash-header"><h1>{name}</h1><p class="muted">{inst}</p>
<form method="post" action="/auth/salir">
  <button class="btn-secondary">Cerrar sesión</button>
</form></header>
<div class="stats-grid">
  <div class="stat-card"><h3>Total Estudiantes</h3><p class="stat-value">{te}</p></div>
  <div class="stat-card"><h3>Cuestionarios Activos</h3><p class="stat-value">{ca}</p></div>
  <div class="stat-card"><h3>Respuestas Hoy</h3><p class="stat-value">{rh}</p></div>
  <div class="stat-card"><h3>Completitud Promedio</h3><p class="stat-value">{pc}%</p></div>
</div>"#,
        name = escape(&dash.nombre),
        inst = escape(&dash.institucion),
        te = st.total_estudiantes,
        ca = st.cuestionarios_activos,
        rh = st.respuestas_hoy,
        pc = st.promedio_completitud,
    );

    body.push_str("<div class=\"info-card\"><h3>Recomendaciones</h3><ul>");
    for line in st.advice() {
        let _ = write!(body, "<li>{}</li>", escape(line));
    }
    body.push_str("</ul></div>");

    if !dash.cuestionarios_recientes.is_empty() {
        body.push_str("<h2>Cuestionarios recientes</h2><ul>");
        for r in &dash.cuestionarios_recientes {
            let _ = write!(
                body,
                "<li>{} {} · {} respuestas · {}</li>",
                escape(&r.titulo),
                escape(&version_label(r.version.as_ref())),
                r.respuestas_totales,
                if r.activo { "Activo" } else { "Inactivo" }
            );
        }
        body.push_str("</ul>");
    }

    body.push_str("<h2>Actividad reciente</h2><ul class=\"activity\">");
    for a in &dash.actividad_reciente {
        let _ = write!(
            body,
            "<li>{} · {} · {} · {} recomendaciones</li>",
            escape(&a.estudiante),
            escape(&a.cuestionario),
            escape(a.fecha.as_deref().unwrap_or("")),
            a.recomendaciones
        );
    }
    body.push_str("</ul>");

    let sel = |f: ActiveFilter| if f == filter { " selected" } else { "" };
    let _ = write!(
        body,
        r#"<h2>Cuestionarios</h2>
<form method="get" action="/orientador/dashboard" class="filters">
  <input name="q" value="{q}" placeholder="Buscar cuestionarios..."/>
  <select name="estado">
    <option value="todos"{s0}>Todos</option>
    <option value="activos"{s1}>Activos</option>
    <option value="inactivos"{s2}>Inactivos</option>
  </select>
  <button class="btn-secondary">Filtrar</button>
</form>
<table class="cuestionarios">
<tr><th>Título</th><th>Versión</th><th>Preguntas</th><th>Respuestas</th>
  <th>Completados</th><th>Estado</th><th></th></tr>"#,
        q = escape(search),
        s0 = sel(ActiveFilter::Todos),
        s1 = sel(ActiveFilter::Activos),
        s2 = sel(ActiveFilter::Inactivos),
    );
    for q in listing {
        let _ = write!(
            body,
            r#"<tr><td>{title}</td><td>{ver}</td><td>{n}</td><td>{resp}</td><td>{done}</td>
<td>{estado}</td><td>
  <form method="post" action="/orientador/cuestionarios/{id}/estado">
    <input type="hidden" name="activo" value="{next}"/>
    <button class="btn-secondary">{toggle}</button></form>
  <form method="post" action="/orientador/cuestionarios/{id}/eliminar">
    <button class="btn-danger">Eliminar</button></form>
</td></tr>"#,
            id = q.id,
            title = escape(&q.titulo),
            ver = escape(&version_label(q.version.as_ref())),
            n = q.num_preguntas,
            resp = q.respuestas_totales,
            done = q.resultados_completados,
            estado = if q.activo { "Activo" } else { "Inactivo" },
            next = !q.activo,
            toggle = if q.activo { "Desactivar" } else { "Activar" },
        );
    }
    body.push_str("</table>");

    let categories: String = CATEGORIES
        .iter()
        .map(|c| format!(r#"<option value="{0}">{0}</option>"#, escape(c)))
        .collect();
    body.push_str(
        r#"<h2>Crear cuestionario</h2>
<form method="post" action="/orientador/cuestionarios" class="crear-cuestionario">
  <input name="titulo" placeholder="Título *"/>
  <textarea name="descripcion" placeholder="Descripción *"></textarea>
  <label><input type="checkbox" name="activo" checked/> Activo</label>"#,
    );
    let rows = rows.clamp(1, MAX_QUESTION_ROWS);
    for n in 1..=rows {
        let _ = write!(
            body,
            r#"
  <div class="pregunta-item">
    <input name="pregunta_texto" placeholder="Pregunta {n}"/>
    <select name="pregunta_categoria">{categories}</select>
  </div>"#,
        );
    }
    body.push_str("\n  <p class=\"row-controls\">");
    if rows < MAX_QUESTION_ROWS {
        let _ = write!(
            body,
            r#"<a href="/orientador/dashboard?preguntas={}">Agregar pregunta</a> "#,
            rows + 1
        );
    }
    if rows > 1 {
        let _ = write!(
            body,
            r#"<a href="/orientador/dashboard?preguntas={}">Quitar pregunta</a>"#,
            rows - 1
        );
    }
    body.push_str(
        r#"</p>
  <button class="btn-primary">Crear cuestionario</button>
</form>"#,
    );
    layout("Panel del orientador", &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape(r#"<b a="1">&'"#), "&lt;b a=&quot;1&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn authoring_rows_are_clamped() {
        let dash = CounselorDashboard::default();
        let rows = |n| {
            counselor_page(&dash, &[], "", ActiveFilter::Todos, n, None)
                .0
                .matches(r#"name="pregunta_texto""#)
                .count()
        };
        assert_eq!(rows(0), 1);
        assert_eq!(rows(4), 4);
        assert_eq!(rows(500), MAX_QUESTION_ROWS);

        let single = counselor_page(&dash, &[], "", ActiveFilter::Todos, 1, None).0;
        assert!(single.contains("Agregar pregunta"));
        assert!(!single.contains("Quitar pregunta"));
    }

    #[test]
    fn version_labels() {
        assert_eq!(version_label(Some(&serde_json::json!("1.2"))), "1.2");
        assert_eq!(version_label(Some(&serde_json::json!(3))), "3");
        assert_eq!(version_label(None), "");
    }

    #[test]
    fn confirmation_dialog_only_when_confirming() {
        let q = crate::testing::three_questions();
        let mut v = AttemptView {
            questionnaire: &q,
            question: &q.preguntas[0],
            index: 0,
            selected: Some(31),
            progress: Progress::compute(3, 3),
            phase: &Phase::Active,
            notice: None,
        };
        let page = attempt_page(&v).0;
        assert!(!page.contains("¿Finalizar cuestionario?"));
        assert!(page.contains("opcion-button selected"));

        v.phase = &Phase::Confirming;
        assert!(attempt_page(&v).0.contains("¿Finalizar cuestionario?"));
    }
}
