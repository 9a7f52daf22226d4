//! Settings record and the checks applied before a run may touch anything.

use std::fmt;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").expect("email shape regex"));

/// Persisted settings as the operator saved them.
///
/// Every field is optional on disk: an older or hand-edited `settings.json`
/// may lack any of them, and [`validate`] decides what is acceptable.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    /// Recipient address of the accounting office.
    pub contabilidade: Option<String>,
    pub cnpj: Option<String>,
    /// Base directory of the sales tree (`<base>/<year>/<MM>`).
    pub pasta_vendas: Option<PathBuf>,
    /// Base directory of the cancellations tree (`<base>/<year>/<MM>`).
    pub pasta_cancelados: Option<PathBuf>,
}

impl Settings {
    /// Overwrite fields that are set in `update`, keeping the rest.
    pub fn merge(&mut self, update: Settings) {
        let Settings {
            name,
            email,
            password,
            contabilidade,
            cnpj,
            pasta_vendas,
            pasta_cancelados,
        } = update;
        if name.is_some() {
            self.name = name;
        }
        if email.is_some() {
            self.email = email;
        }
        if password.is_some() {
            self.password = password;
        }
        if contabilidade.is_some() {
            self.contabilidade = contabilidade;
        }
        if cnpj.is_some() {
            self.cnpj = cnpj;
        }
        if pasta_vendas.is_some() {
            self.pasta_vendas = pasta_vendas;
        }
        if pasta_cancelados.is_some() {
            self.pasta_cancelados = pasta_cancelados;
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("contabilidade", &self.contabilidade)
            .field("cnpj", &self.cnpj)
            .field("pasta_vendas", &self.pasta_vendas)
            .field("pasta_cancelados", &self.pasta_cancelados)
            .finish()
    }
}

/// Settings that passed [`validate`]. Required fields are guaranteed non-blank.
#[derive(Clone, PartialEq, Eq)]
pub struct ValidSettings {
    pub name: String,
    pub email: String,
    pub password: String,
    pub contabilidade: String,
    pub cnpj: String,
    pub pasta_vendas: Option<PathBuf>,
    pub pasta_cancelados: Option<PathBuf>,
}

impl fmt::Debug for ValidSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidSettings")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("contabilidade", &self.contabilidade)
            .field("cnpj", &self.cnpj)
            .field("pasta_vendas", &self.pasta_vendas)
            .field("pasta_cancelados", &self.pasta_cancelados)
            .finish_non_exhaustive()
    }
}

/// A settings field, displayed with the label the operator knows it by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    Name,
    Email,
    Password,
    Contabilidade,
    Cnpj,
    PastaVendas,
    PastaCancelados,
}

impl SettingsField {
    pub fn label(self) -> &'static str {
        match self {
            SettingsField::Name => "nome",
            SettingsField::Email => "email",
            SettingsField::Password => "senha",
            SettingsField::Contabilidade => "destino",
            SettingsField::Cnpj => "cnpj",
            SettingsField::PastaVendas => "Pasta de vendas",
            SettingsField::PastaCancelados => "Pasta de cancelamentos",
        }
    }
}

impl fmt::Display for SettingsField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Arquivo de configuração não existe.")]
    MissingConfig,
    #[error("A configuração '{0}' está indefinido, preencha as configurações novamente.")]
    MissingField(SettingsField),
    #[error("A configuração '{0}' não está no formato de um email.")]
    InvalidEmailFormat(SettingsField),
    #[error("{0} inválida.")]
    MissingFolder(SettingsField),
}

/// Validate settings before a run.
///
/// Checks run in a fixed order and the first failure wins:
/// name, email, email shape, password, recipient, recipient shape, cnpj.
/// Folder paths are not required here; a missing folder only means that
/// category has nothing to send.
pub fn validate(settings: Option<&Settings>) -> Result<ValidSettings, ValidationError> {
    let settings = settings.ok_or(ValidationError::MissingConfig)?;

    let name = required(&settings.name, SettingsField::Name)?;
    let email = required(&settings.email, SettingsField::Email)?;
    ensure_email_shape(email, SettingsField::Email)?;
    let password = required(&settings.password, SettingsField::Password)?;
    let contabilidade = required(&settings.contabilidade, SettingsField::Contabilidade)?;
    ensure_email_shape(contabilidade, SettingsField::Contabilidade)?;
    let cnpj = required(&settings.cnpj, SettingsField::Cnpj)?;

    Ok(ValidSettings {
        name: name.to_string(),
        email: email.to_string(),
        password: password.to_string(),
        contabilidade: contabilidade.to_string(),
        cnpj: cnpj.to_string(),
        pasta_vendas: non_empty_path(&settings.pasta_vendas),
        pasta_cancelados: non_empty_path(&settings.pasta_cancelados),
    })
}

/// Validate settings before they are persisted.
///
/// Stricter than [`validate`]: both folder paths must be chosen.
pub fn validate_for_save(settings: &Settings) -> Result<ValidSettings, ValidationError> {
    let valid = validate(Some(settings))?;
    if valid.pasta_vendas.is_none() {
        return Err(ValidationError::MissingFolder(SettingsField::PastaVendas));
    }
    if valid.pasta_cancelados.is_none() {
        return Err(ValidationError::MissingFolder(SettingsField::PastaCancelados));
    }
    Ok(valid)
}

/// Loose email shape: `non-space @ non-space . non-space` anywhere in the value.
pub fn is_email_shaped(value: &str) -> bool {
    EMAIL_SHAPE.is_match(value)
}

fn required(value: &Option<String>, field: SettingsField) -> Result<&str, ValidationError> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ValidationError::MissingField(field)),
    }
}

fn ensure_email_shape(value: &str, field: SettingsField) -> Result<(), ValidationError> {
    if is_email_shaped(value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmailFormat(field))
    }
}

fn non_empty_path(path: &Option<PathBuf>) -> Option<PathBuf> {
    path.as_ref().filter(|p| !p.as_os_str().is_empty()).cloned()
}
