use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::lenient::{
    deserialize_amount, deserialize_flag, deserialize_list, deserialize_optional_amount,
    deserialize_optional_date, deserialize_optional_months, deserialize_optional_text,
    deserialize_or_default, deserialize_text,
};

/// Sale modality of the listing; decides whether an auctioneer commission applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    #[default]
    #[serde(alias = "Leilão Judicial")]
    JudicialAuction,
    #[serde(alias = "Venda Direta")]
    DirectSale,
    #[serde(alias = "Venda Online")]
    OnlineSale,
    #[serde(alias = "Licitação Aberta")]
    OpenBid,
    #[serde(alias = "Leilão SFI - 1º Leilão")]
    SfiFirstAuction,
    #[serde(alias = "Leilão SFI - 2º Leilão")]
    SfiSecondAuction,
}

impl Modality {
    pub const fn label(self) -> &'static str {
        match self {
            Self::JudicialAuction => "Leilão Judicial",
            Self::DirectSale => "Venda Direta",
            Self::OnlineSale => "Venda Online",
            Self::OpenBid => "Licitação Aberta",
            Self::SfiFirstAuction => "Leilão SFI - 1º Leilão",
            Self::SfiSecondAuction => "Leilão SFI - 2º Leilão",
        }
    }

    /// Direct and online sales are closed without an auctioneer.
    pub const fn charges_auctioneer(self) -> bool {
        !matches!(self, Self::DirectSale | Self::OnlineSale)
    }
}

/// How the buyer intends to pay for the property.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    #[serde(alias = "À vista")]
    Cash,
    #[serde(alias = "Parcelado")]
    Installments,
    #[serde(alias = "Financiamento")]
    Financing,
}

/// Loan-to-value tier offered by the lender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FinancingTier {
    NinetyFive,
    Eighty,
}

impl FinancingTier {
    pub const fn ratio(self) -> f64 {
        match self {
            Self::NinetyFive => 0.95,
            Self::Eighty => 0.80,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::NinetyFive => "Caixa (95%)",
            Self::Eighty => "Demais Bancos (80%)",
        }
    }
}

/// Financing choice, decided once from the form label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Financing {
    #[default]
    None,
    Financed(FinancingTier),
}

impl Financing {
    pub fn from_label(label: &str) -> Self {
        if label.contains("95%") {
            Self::Financed(FinancingTier::NinetyFive)
        } else if label.contains("80%") {
            Self::Financed(FinancingTier::Eighty)
        } else {
            Self::None
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "Não",
            Self::Financed(tier) => tier.label(),
        }
    }

    pub const fn tier(self) -> Option<FinancingTier> {
        match self {
            Self::None => None,
            Self::Financed(tier) => Some(tier),
        }
    }
}

impl Serialize for Financing {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Financing {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(label) => Self::from_label(&label),
            _ => Self::None,
        })
    }
}

/// Market comparable used to derive the price per square metre.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Comparable {
    #[serde(default, deserialize_with = "deserialize_text")]
    pub link: String,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub value: f64,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub area: f64,
}

impl Comparable {
    pub fn new(link: impl Into<String>, value: f64, area: f64) -> Self {
        Self {
            link: link.into(),
            value,
            area,
        }
    }

    /// Price per m², or `None` when either side is missing.
    pub fn unit_price(&self) -> Option<f64> {
        if self.value > 0.0 && self.area > 0.0 {
            Some(self.value / self.area)
        } else {
            None
        }
    }
}

/// Everything an analyst records about one auction property.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyAnalysisInput {
    #[serde(deserialize_with = "deserialize_text")]
    pub address: String,
    #[serde(deserialize_with = "deserialize_optional_date")]
    pub auction_date: Option<NaiveDate>,
    #[serde(deserialize_with = "deserialize_or_default")]
    pub modality: Modality,
    #[serde(deserialize_with = "deserialize_flag")]
    pub occupied: bool,
    #[serde(deserialize_with = "deserialize_amount")]
    pub private_area: f64,
    #[serde(deserialize_with = "deserialize_amount")]
    pub itbi_rate: f64,
    #[serde(deserialize_with = "deserialize_list")]
    pub comparables: Vec<Comparable>,
    #[serde(deserialize_with = "deserialize_flag")]
    pub condo_debt_rule: bool,
    #[serde(deserialize_with = "deserialize_amount")]
    pub bank_valuation: f64,
    #[serde(deserialize_with = "deserialize_amount")]
    pub condo_debt: f64,
    #[serde(deserialize_with = "deserialize_amount")]
    pub iptu_debt: f64,
    #[serde(deserialize_with = "deserialize_amount")]
    pub registry_value: f64,
    #[serde(deserialize_with = "deserialize_amount")]
    pub renovation_value: f64,
    #[serde(deserialize_with = "deserialize_amount")]
    pub condo_fee: f64,
    #[serde(deserialize_with = "deserialize_amount")]
    pub monthly_iptu: f64,
    #[serde(deserialize_with = "deserialize_or_default")]
    pub payment_method: PaymentMethod,
    pub financing: Financing,
    #[serde(deserialize_with = "deserialize_optional_amount")]
    pub financing_rate: Option<f64>,
    #[serde(deserialize_with = "deserialize_optional_months")]
    pub financing_term: Option<u32>,
    #[serde(deserialize_with = "deserialize_optional_months")]
    pub sales_period: Option<u32>,
    #[serde(deserialize_with = "deserialize_amount")]
    pub initial_bid: f64,
    #[serde(deserialize_with = "deserialize_amount")]
    pub max_bid: f64,
    #[serde(deserialize_with = "deserialize_optional_date")]
    pub last_owner_registry_date: Option<NaiveDate>,
    #[serde(deserialize_with = "deserialize_text")]
    pub notes: String,
}

impl PropertyAnalysisInput {
    /// Switching the payment method always clears the financing choice.
    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        self.payment_method = method;
        self.financing = Financing::None;
    }

    /// Fills only the fields the analyst left empty, returning the names of the fields written.
    pub fn merge_missing(&mut self, partial: PartialAnalysisInput) -> Vec<&'static str> {
        let mut applied = Vec::new();

        fill_text(&mut self.address, partial.address, "address", &mut applied);
        fill_amount(
            &mut self.private_area,
            partial.private_area,
            "private_area",
            &mut applied,
        );
        fill_amount(
            &mut self.bank_valuation,
            partial.bank_valuation,
            "bank_valuation",
            &mut applied,
        );
        fill_amount(
            &mut self.condo_debt,
            partial.condo_debt,
            "condo_debt",
            &mut applied,
        );
        fill_amount(
            &mut self.iptu_debt,
            partial.iptu_debt,
            "iptu_debt",
            &mut applied,
        );
        fill_amount(
            &mut self.condo_fee,
            partial.condo_fee,
            "condo_fee",
            &mut applied,
        );
        fill_amount(
            &mut self.monthly_iptu,
            partial.monthly_iptu,
            "monthly_iptu",
            &mut applied,
        );
        fill_amount(
            &mut self.initial_bid,
            partial.initial_bid,
            "initial_bid",
            &mut applied,
        );

        if self.auction_date.is_none() && partial.auction_date.is_some() {
            self.auction_date = partial.auction_date;
            applied.push("auction_date");
        }
        if self.last_owner_registry_date.is_none() && partial.last_owner_registry_date.is_some() {
            self.last_owner_registry_date = partial.last_owner_registry_date;
            applied.push("last_owner_registry_date");
        }
        if let Some(modality) = partial.modality {
            if self.modality == Modality::default() && modality != self.modality {
                self.modality = modality;
                applied.push("modality");
            }
        }
        if self.comparables.is_empty() && !partial.comparables.is_empty() {
            self.comparables = partial.comparables;
            applied.push("comparables");
        }

        applied
    }
}

fn fill_amount(
    target: &mut f64,
    value: Option<f64>,
    name: &'static str,
    applied: &mut Vec<&'static str>,
) {
    if let Some(value) = value.filter(|value| value.is_finite() && *value > 0.0) {
        if *target == 0.0 {
            *target = value;
            applied.push(name);
        }
    }
}

fn fill_text(
    target: &mut String,
    value: Option<String>,
    name: &'static str,
    applied: &mut Vec<&'static str>,
) {
    if let Some(value) = value.filter(|value| !value.trim().is_empty()) {
        if target.trim().is_empty() {
            *target = value;
            applied.push(name);
        }
    }
}

/// Best-effort subset of the form produced by the extraction oracle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialAnalysisInput {
    #[serde(deserialize_with = "deserialize_optional_text")]
    pub address: Option<String>,
    #[serde(deserialize_with = "deserialize_optional_date")]
    pub auction_date: Option<NaiveDate>,
    #[serde(deserialize_with = "deserialize_or_default")]
    pub modality: Option<Modality>,
    #[serde(deserialize_with = "deserialize_optional_amount")]
    pub private_area: Option<f64>,
    #[serde(deserialize_with = "deserialize_optional_amount")]
    pub bank_valuation: Option<f64>,
    #[serde(deserialize_with = "deserialize_optional_amount")]
    pub condo_debt: Option<f64>,
    #[serde(deserialize_with = "deserialize_optional_amount")]
    pub iptu_debt: Option<f64>,
    #[serde(deserialize_with = "deserialize_optional_amount")]
    pub condo_fee: Option<f64>,
    #[serde(deserialize_with = "deserialize_optional_amount")]
    pub monthly_iptu: Option<f64>,
    #[serde(deserialize_with = "deserialize_optional_amount")]
    pub initial_bid: Option<f64>,
    #[serde(deserialize_with = "deserialize_optional_date")]
    pub last_owner_registry_date: Option<NaiveDate>,
    #[serde(deserialize_with = "deserialize_list")]
    pub comparables: Vec<Comparable>,
}
