use chrono::{Datelike, Local, NaiveDate};

/// Accrued municipal tax the previous owner most likely left unpaid: one `monthly_iptu` for
/// every calendar month since the last ownership registration.
///
/// Months are counted from the year/month components only, so partial months never count.
/// A registration date in the future yields 0.
pub fn estimate_hidden_debt(
    last_owner_registry_date: Option<NaiveDate>,
    monthly_iptu: f64,
    today: NaiveDate,
) -> f64 {
    let Some(registered) = last_owner_registry_date else {
        return 0.0;
    };
    if !monthly_iptu.is_finite() || monthly_iptu <= 0.0 {
        return 0.0;
    }

    let months = elapsed_months(registered, today);
    if months <= 0 {
        return 0.0;
    }

    months as f64 * monthly_iptu
}

pub fn estimate_hidden_debt_today(
    last_owner_registry_date: Option<NaiveDate>,
    monthly_iptu: f64,
) -> f64 {
    estimate_hidden_debt(
        last_owner_registry_date,
        monthly_iptu,
        Local::now().date_naive(),
    )
}

fn elapsed_months(from: NaiveDate, to: NaiveDate) -> i64 {
    let years = i64::from(to.year()) - i64::from(from.year());
    let months = i64::from(to.month()) - i64::from(from.month());
    years * 12 + months
}
