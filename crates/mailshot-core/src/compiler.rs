//! Mail compilation: account + SMTP profile + template + mail overrides.

use crate::config::{AppConfig, AttachmentConfig, HeaderMap, MessageFile, SmtpConfig};
use crate::error::{Error, Result};
use crate::template::{Evaluator, parse_bool};
use mailshot_mime::{Attachment, Headers, Message, canonical_key};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::debug;

/// SMTP profile with every field evaluated and typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledSmtp {
    /// Profile name.
    pub name: String,
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// STARTTLS on a plain connection instead of implicit TLS.
    pub start_tls: bool,
    /// Skip certificate verification.
    pub skip_verify: bool,
}

/// Everything needed to send one mail.
#[derive(Clone)]
pub struct CompiledMail {
    /// SMTP login; empty disables authentication.
    pub login_user: String,
    /// SMTP password.
    pub password: String,
    /// Server settings.
    pub smtp: CompiledSmtp,
    /// The message to send.
    pub message: Message,
}

impl std::fmt::Debug for CompiledMail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledMail")
            .field("login_user", &self.login_user)
            .field("password", &"<redacted>")
            .field("smtp", &self.smtp)
            .field("message", &self.message)
            .finish()
    }
}

/// Resolves `account` and `mail` into a [`CompiledMail`].
///
/// Template headers are kept unless the mail overrides the same field, in
/// which case all of the mail's values replace all of the template's. Every
/// value passes through `evaluator`. `To` is not checked here.
///
/// # Errors
///
/// Returns a lookup error for an unknown account, SMTP profile, mail or
/// template; [`Error::InvalidPort`] / [`Error::InvalidBool`] for bad SMTP
/// values; [`Error::MissingHeader`] if no `From` can be resolved;
/// [`Error::Attach`] if an attachment cannot be read; and any evaluation
/// error.
pub fn compile_mail(
    evaluator: &impl Evaluator,
    config: &AppConfig,
    messages: &MessageFile,
    account: &str,
    mail: &str,
) -> Result<CompiledMail> {
    let account_config = config
        .account(account)
        .ok_or_else(|| Error::AccountNotFound(account.to_string()))?;

    let login_user = evaluator.evaluate(&account_config.login_user)?;
    let password = evaluator.evaluate(&account_config.password)?;
    let smtp_ref = evaluator.evaluate(&account_config.smtp_ref)?;
    let smtp_config = config
        .smtp(&smtp_ref)
        .ok_or(Error::SmtpNotFound(smtp_ref))?;
    let smtp = compile_smtp(evaluator, smtp_config)?;

    let mail_config = messages
        .mail(mail)
        .ok_or_else(|| Error::MailNotFound(mail.to_string()))?;
    let template = messages
        .template(&mail_config.template)
        .ok_or_else(|| Error::TemplateNotFound(mail_config.template.clone()))?;

    let mut message = Message::new();
    let overridden: HashSet<String> = mail_config
        .spec
        .header
        .keys()
        .map(|k| canonical_key(k))
        .collect();
    for (name, values) in &template.header {
        if overridden.contains(&canonical_key(name)) {
            continue;
        }
        for value in values.as_slice() {
            message.add_header(name, evaluator.evaluate(value)?);
        }
    }
    add_evaluated(evaluator, &mut message.headers, &mail_config.spec.header)?;

    if message.header("From").is_none_or(str::is_empty) {
        let from = evaluator.evaluate(&account_config.default_from)?;
        if from.is_empty() {
            return Err(Error::MissingHeader("From".to_string()));
        }
        message.set_header("From", from);
    }

    let body = evaluator.evaluate(&mail_config.spec.body)?;
    message.body = if body.is_empty() {
        evaluator.evaluate(&template.body)?
    } else {
        body
    };

    for attachment in mail_config
        .spec
        .attachments
        .iter()
        .chain(&template.attachments)
    {
        message.attach(compile_attachment(evaluator, attachment)?);
    }

    debug!(
        account,
        mail,
        template = %template.name,
        smtp = %smtp.name,
        attachments = message.attachments().len(),
        "compiled mail"
    );

    Ok(CompiledMail {
        login_user,
        password,
        smtp,
        message,
    })
}

fn compile_smtp(evaluator: &impl Evaluator, config: &SmtpConfig) -> Result<CompiledSmtp> {
    let name = evaluator.evaluate(&config.name)?;
    let host = evaluator.evaluate(&config.host)?;

    let port_text = evaluator.evaluate(&config.port)?;
    let port = port_text
        .parse::<u16>()
        .map_err(|_| Error::InvalidPort(port_text.clone()))?;

    let start_tls = evaluate_bool(evaluator, "starttls", &config.starttls)?;
    let skip_verify = evaluate_bool(evaluator, "skipVerify", &config.skip_verify)?;

    Ok(CompiledSmtp {
        name,
        host,
        port,
        start_tls,
        skip_verify,
    })
}

fn evaluate_bool(evaluator: &impl Evaluator, field: &'static str, source: &str) -> Result<bool> {
    let value = evaluator.evaluate(source)?;
    parse_bool(&value).ok_or(Error::InvalidBool { field, value })
}

fn add_evaluated(evaluator: &impl Evaluator, headers: &mut Headers, source: &HeaderMap) -> Result<()> {
    for (name, values) in source {
        for value in values.as_slice() {
            headers.add(name, evaluator.evaluate(value)?);
        }
    }
    Ok(())
}

fn compile_attachment(evaluator: &impl Evaluator, config: &AttachmentConfig) -> Result<Attachment> {
    let name = evaluator.evaluate(&config.name)?;
    let path = PathBuf::from(evaluator.evaluate(&config.path)?);
    let mut headers = Headers::new();
    add_evaluated(evaluator, &mut headers, &config.header)?;

    Attachment::from_file(&path, &name, headers).map_err(|e| match e {
        mailshot_mime::Error::Io { path, source } => Error::Attach { path, source },
        other => Error::Mime(other),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Returns expressions unchanged, except `{{x}}` which maps to `X`.
    struct Literal;

    impl Evaluator for Literal {
        fn evaluate(&self, expression: &str) -> Result<String> {
            Ok(expression.replace("{{x}}", "X"))
        }
    }

    fn config(smtp: &str) -> AppConfig {
        AppConfig::from_yaml(&format!(
            "smtp:\n{smtp}\naccounts:\n  - name: a1\n    smtpRef: s1\n    loginUser: u\n    password: p\n    defaultFrom: d@x.com\n"
        ))
        .unwrap()
    }

    fn default_config() -> AppConfig {
        config("  - {name: s1, host: h, port: 587, starttls: true}")
    }

    fn messages(yaml: &str) -> MessageFile {
        MessageFile::from_yaml(yaml).unwrap()
    }

    const BASIC: &str = "
templates:
  - name: t1
    header:
      Subject: Hello {{x}}
      To: t@x.com
    body: Template body
mails:
  - name: m1
    template: t1
    spec:
      header:
        to: [b@x.com, c@x.com]
  - name: m2
    template: t1
    spec:
      header:
        subject: Override
        from: me@x.com
  - name: m3
    template: missing
";

    #[test]
    fn override_replaces_per_key() {
        let compiled = compile_mail(&Literal, &default_config(), &messages(BASIC), "a1", "m1").unwrap();
        let headers = &compiled.message.headers;

        assert_eq!(headers.get_all("To"), ["b@x.com", "c@x.com"]);
        assert_eq!(headers.get("Subject"), Some("Hello X"));
        assert_eq!(headers.get("From"), Some("d@x.com"));
        assert_eq!(compiled.message.body, "Template body");
    }

    #[test]
    fn subject_override_keeps_template_body() {
        let compiled = compile_mail(&Literal, &default_config(), &messages(BASIC), "a1", "m2").unwrap();
        assert_eq!(compiled.message.header("Subject"), Some("Override"));
        assert_eq!(compiled.message.header("From"), Some("me@x.com"));
        assert_eq!(compiled.message.header("To"), Some("t@x.com"));
        assert_eq!(compiled.message.body, "Template body");
    }

    #[test]
    fn smtp_values_typed() {
        let compiled = compile_mail(&Literal, &default_config(), &messages(BASIC), "a1", "m1").unwrap();
        assert_eq!(
            compiled.smtp,
            CompiledSmtp {
                name: "s1".into(),
                host: "h".into(),
                port: 587,
                start_tls: true,
                skip_verify: true,
            }
        );
        assert_eq!(compiled.login_user, "u");
        assert_eq!(compiled.password, "p");
        assert!(!format!("{compiled:?}").contains("password: \"p\""));
    }

    #[test]
    fn lookup_failures() {
        let m = messages(BASIC);
        let c = default_config();
        assert!(matches!(
            compile_mail(&Literal, &c, &m, "nobody", "m1"),
            Err(Error::AccountNotFound(a)) if a == "nobody"
        ));
        assert!(matches!(
            compile_mail(&Literal, &c, &m, "a1", "nope"),
            Err(Error::MailNotFound(_))
        ));
        assert!(matches!(
            compile_mail(&Literal, &c, &m, "a1", "m3"),
            Err(Error::TemplateNotFound(t)) if t == "missing"
        ));

        let other = config("  - {name: s2, host: h, port: 25, starttls: false}");
        assert!(matches!(
            compile_mail(&Literal, &other, &m, "a1", "m1"),
            Err(Error::SmtpNotFound(s)) if s == "s1"
        ));
    }

    #[test]
    fn bad_port_and_bool() {
        let m = messages(BASIC);
        for port in ["abc", "70000", "-1", "''"] {
            let c = config(&format!("  - {{name: s1, host: h, port: {port}, starttls: true}}"));
            assert!(matches!(
                compile_mail(&Literal, &c, &m, "a1", "m1"),
                Err(Error::InvalidPort(_))
            ));
        }

        let c = config("  - {name: s1, host: h, port: 25, starttls: yes}");
        assert!(matches!(
            compile_mail(&Literal, &c, &m, "a1", "m1"),
            Err(Error::InvalidBool { field: "starttls", .. })
        ));
    }

    #[test]
    fn missing_from_is_reported() {
        let c = AppConfig::from_yaml(
            "smtp:\n  - {name: s1, host: h, port: 25, starttls: false}\naccounts:\n  - {name: a1, smtpRef: s1}\n",
        )
        .unwrap();
        let err = compile_mail(&Literal, &c, &messages(BASIC), "a1", "m1").unwrap_err();
        assert!(matches!(err, Error::MissingHeader(h) if h == "From"));
    }

    #[test]
    fn attachment_order_and_failures() {
        let dir = tempfile::tempdir().unwrap();
        let mine = dir.path().join("mine.txt");
        let shared = dir.path().join("shared.txt");
        std::fs::write(&mine, "m").unwrap();
        std::fs::write(&shared, "s").unwrap();

        let yaml = format!(
            "
templates:
  - name: t1
    header: {{To: t@x.com}}
    attachments:
      - path: {shared}
mails:
  - name: m1
    template: t1
    spec:
      attachments:
        - name: renamed.txt
          path: {mine}
          header: {{Content-Type: text/x-custom}}
  - name: broken
    template: t1
    spec:
      attachments:
        - path: {missing}
",
            shared = shared.display(),
            mine = mine.display(),
            missing = dir.path().join("missing.txt").display(),
        );
        let m = messages(&yaml);

        let compiled = compile_mail(&Literal, &default_config(), &m, "a1", "m1").unwrap();
        let attachments = compiled.message.attachments();
        assert_eq!(attachments.len(), 2);
        assert_eq!(attachments[0].name, "renamed.txt");
        assert_eq!(attachments[0].headers.get("content-type"), Some("text/x-custom"));
        assert_eq!(attachments[1].name, "shared.txt");
        assert_eq!(attachments[1].content, b"s");

        let err = compile_mail(&Literal, &default_config(), &m, "a1", "broken").unwrap_err();
        assert!(matches!(err, Error::Attach { .. }));
        assert!(err.to_string().starts_with("cannot attach file"));
    }
}
