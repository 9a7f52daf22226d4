//! Subject line of the monthly message.

use super::period::TargetPeriod;

/// `Arquivos xml de Cupom Fiscal SAT {month}/{year} - {name} {cnpj}`
pub fn mail_subject(period: TargetPeriod, name: &str, cnpj: &str) -> String {
    format!("Arquivos xml de Cupom Fiscal SAT {period} - {name} {cnpj}")
}
