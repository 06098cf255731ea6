// src/common/formulas.rs

use rust_decimal::{Decimal, RoundingStrategy};

/// Densidade do asfalto (t/m³) usada no cálculo de espessura.
/// Única fonte desse valor no sistema.
pub const ASPHALT_DENSITY: Decimal = Decimal::from_parts(24, 0, 0, false, 1);

/// Regra da empresa: 1.000 m² ≈ 100 toneladas.
pub const AREA_PER_TONNE: Decimal = Decimal::from_parts(10, 0, 0, false, 0);

/// Placeholder exibido quando o valor não existe.
pub const PLACEHOLDER: &str = "-";

// =========================================================================
//  CÁLCULOS
// =========================================================================

/// Espessura da camada em centímetros: toneladas / m² / densidade, convertido de metros.
/// Área zero ou negativa retorna 0 em vez de falhar.
pub fn thickness(mass_t: Decimal, area_m2: Decimal) -> Decimal {
    if area_m2 <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    mass_t
        .checked_div(area_m2)
        .and_then(|v| v.checked_div(ASPHALT_DENSITY))
        .and_then(|v| v.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO)
}

/// Valor faturado de uma rua: área executada × preço por m².
/// `None` quando o produto estoura a faixa do `Decimal`.
pub fn billed_value(area_m2: Decimal, unit_price: Decimal) -> Option<Decimal> {
    area_m2.checked_mul(unit_price)
}

/// Soma que devolve `None` em vez de estourar.
pub fn checked_sum<I>(values: I) -> Option<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v))
}

/// Toneladas previstas a partir da metragem (metragem ÷ 10).
pub fn estimated_mass(area_m2: Decimal) -> Decimal {
    if area_m2 <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    area_m2 / AREA_PER_TONNE
}

/// Percentual de progresso limitado a 0..=100.
pub fn progress_pct(done: Decimal, planned: Decimal) -> Decimal {
    if planned <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let pct = done
        .checked_div(planned)
        .and_then(|v| v.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO);
    pct.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
}

// =========================================================================
//  FORMATAÇÃO (pt-BR)
// =========================================================================

pub fn format_currency(value: Option<Decimal>) -> String {
    match value {
        Some(v) if v.is_sign_negative() && !v.is_zero() => {
            format!("-R$ {}", format_number(v.abs(), 2, 2))
        }
        Some(v) => format!("R$ {}", format_number(v, 2, 2)),
        None => PLACEHOLDER.to_string(),
    }
}

pub fn format_area(value: Option<Decimal>) -> String {
    value
        .map(|v| format!("{} m²", format_number(v, 0, 2)))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

pub fn format_mass(value: Option<Decimal>) -> String {
    value
        .map(|v| format!("{} t", format_number(v, 0, 2)))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

pub fn format_thickness(value: Option<Decimal>) -> String {
    value
        .map(|v| format!("{} cm", format_number(v, 2, 2)))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

// Separador de milhar "." e decimal ",", com casas entre min_dp e max_dp.
fn format_number(value: Decimal, min_dp: u32, max_dp: u32) -> String {
    let rounded = value.round_dp_with_strategy(max_dp, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.*}", max_dp as usize, rounded.abs());

    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i.to_string(), f.to_string()),
        None => (text.clone(), String::new()),
    };

    let mut frac = frac_part;
    while frac.len() > min_dp as usize && frac.ends_with('0') {
        frac.pop();
    }

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    if frac.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{},{}", sign, grouped, frac)
    }
}
