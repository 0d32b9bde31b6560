//! Outbound email templates.
//!
//! Each template renders a subject plus HTML and plain-text bodies. All
//! interpolated values pass through [`html_escape`] in the HTML variant.

use super::html_escape;

/// A renderable email
pub trait EmailTemplate {
    fn subject(&self) -> String;
    fn body_html(&self) -> String;
    fn body_text(&self) -> String;
}

/// Account verification code sent right after registration
pub struct VerificationEmailTemplate<'a> {
    pub code: &'a str,
}

impl EmailTemplate for VerificationEmailTemplate<'_> {
    fn subject(&self) -> String {
        "Verificación de cuenta".to_string()
    }

    fn body_html(&self) -> String {
        format!(
            "<p>Tu código de verificación es: <strong>{}</strong></p>\
             <p>Introduce este código en la aplicación para validar tu cuenta.</p>",
            html_escape(self.code)
        )
    }

    fn body_text(&self) -> String {
        format!("Tu código de verificación es: {}", self.code)
    }
}

/// Password-recovery token
pub struct PasswordResetEmailTemplate<'a> {
    pub token: &'a str,
}

impl EmailTemplate for PasswordResetEmailTemplate<'_> {
    fn subject(&self) -> String {
        "Recuperación de contraseña".to_string()
    }

    fn body_html(&self) -> String {
        format!(
            "<p>Tu token de recuperación es: <strong>{}</strong></p>\
             <p>Caduca en 15 minutos.</p>",
            html_escape(self.token)
        )
    }

    fn body_text(&self) -> String {
        format!("Tu token de recuperación es: {} (caduca en 15 minutos)", self.token)
    }
}

/// Invitation with temporary credentials for a new guest teammate
pub struct InvitationEmailTemplate<'a> {
    pub inviter_email: &'a str,
    pub email: &'a str,
    pub temp_password: &'a str,
    pub code: &'a str,
}

impl EmailTemplate for InvitationEmailTemplate<'_> {
    fn subject(&self) -> String {
        "Invitación para unirse a la compañía".to_string()
    }

    fn body_html(&self) -> String {
        format!(
            "<p>Has sido invitado a unirte a la compañía de {} como usuario guest.</p>\
             <p>Credenciales temporales:</p>\
             <ul>\
             <li>Email: {}</li>\
             <li>Contraseña temporal: {}</li>\
             <li>Código de verificación: {}</li>\
             </ul>\
             <p>Inicia sesión y valida tu cuenta con el código anterior.</p>",
            html_escape(self.inviter_email),
            html_escape(self.email),
            html_escape(self.temp_password),
            html_escape(self.code),
        )
    }

    fn body_text(&self) -> String {
        format!(
            "Has sido invitado a unirte a la compañía de {} como usuario guest.\n\n\
             Email: {}\n\
             Contraseña temporal: {}\n\
             Código de verificación: {}\n\n\
             Inicia sesión y valida tu cuenta con el código anterior.",
            self.inviter_email, self.email, self.temp_password, self.code,
        )
    }
}
