use shared::{
    domain::{Address, FrequencyUnit, RiskLevel, ADDRESS_LEN},
    protocol::{DcaPlan, DcaPlanSubmission},
};

/// Plans whose owner matches `owner`, ignoring hex case. Plans without an
/// owner are never shown.
pub fn owned_plans(plans: impl IntoIterator<Item = DcaPlan>, owner: &Address) -> Vec<DcaPlan> {
    plans
        .into_iter()
        .filter(|plan| {
            plan.owner_address
                .as_ref()
                .is_some_and(|plan_owner| plan_owner.eq_ignore_case(owner))
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Raw plan form input, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanDraft {
    pub amount: String,
    pub frequency_value: String,
    pub frequency_unit: String,
    pub to_address: String,
    pub token_symbol: String,
    pub risk_level: String,
}

impl Default for PlanDraft {
    fn default() -> Self {
        Self {
            amount: String::new(),
            frequency_value: String::new(),
            frequency_unit: FrequencyUnit::Minutes.as_str().to_string(),
            to_address: String::new(),
            token_symbol: "SONIC".to_string(),
            risk_level: RiskLevel::Low.as_str().to_string(),
        }
    }
}

impl PlanDraft {
    /// Checks every field and builds the backend submission. All problems are
    /// reported at once, one entry per field.
    pub fn validate(&self) -> Result<DcaPlanSubmission, Vec<FieldError>> {
        let mut errors = Vec::new();

        let amount = match self.amount.trim() {
            "" => {
                errors.push(FieldError::new("amount", "Amount is required"));
                None
            }
            raw => match raw.parse::<f64>() {
                Ok(value) if value.is_finite() && value > 0.0 => Some(value),
                _ => {
                    errors.push(FieldError::new("amount", "Amount must be a positive number"));
                    None
                }
            },
        };

        let frequency_value = match self.frequency_value.trim() {
            "" => {
                errors.push(FieldError::new(
                    "frequency_value",
                    "Frequency value is required",
                ));
                None
            }
            raw => match raw.parse::<u32>() {
                Ok(value) if value > 0 => Some(value),
                _ => {
                    errors.push(FieldError::new(
                        "frequency_value",
                        "Frequency value must be a positive whole number",
                    ));
                    None
                }
            },
        };

        let frequency_unit = if self.frequency_unit.trim().is_empty() {
            errors.push(FieldError::new("frequency_unit", "Frequency unit is required"));
            None
        } else {
            let unit = FrequencyUnit::parse(&self.frequency_unit);
            if unit.is_none() {
                errors.push(FieldError::new(
                    "frequency_unit",
                    "Frequency unit must be minutes, hours or days",
                ));
            }
            unit
        };

        let to_address = Address::new(self.to_address.trim());
        if to_address.as_str().len() != ADDRESS_LEN {
            errors.push(FieldError::new("to_address", "Invalid address"));
        }

        let risk_level = RiskLevel::parse(&self.risk_level);
        if risk_level.is_none() {
            errors.push(FieldError::new("risk_level", "Please select a risk level"));
        }

        match (amount, frequency_value, frequency_unit, risk_level) {
            (Some(amount), Some(value), Some(unit), Some(risk_level)) if errors.is_empty() => {
                Ok(DcaPlanSubmission {
                    token: self.token_symbol.trim().to_ascii_lowercase(),
                    amount,
                    frequency: format!("{value} {unit}"),
                    to_address,
                    risk_level,
                    user_address: None,
                })
            }
            _ => Err(errors),
        }
    }
}
