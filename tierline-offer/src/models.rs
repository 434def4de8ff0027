use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::uniqueness::UniqueChecker;
use crate::validation::{
    validate_code, validate_currency, validate_display_description, validate_display_title,
    validate_name, OfferError, MAX_DURATION_MONTHS,
};

/// Discount shape
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OfferType {
    Fixed,
    Percent,
}

/// Billing interval the offer applies to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OfferCadence {
    Month,
    Year,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OfferStatus {
    Active,
    Archived,
}

impl fmt::Display for OfferType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OfferType::Fixed => write!(f, "fixed"),
            OfferType::Percent => write!(f, "percent"),
        }
    }
}

impl FromStr for OfferType {
    type Err = OfferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fixed" => Ok(OfferType::Fixed),
            "percent" => Ok(OfferType::Percent),
            _ => Err(OfferError::UnknownValue { kind: "type", value: s.to_string() }),
        }
    }
}

impl fmt::Display for OfferCadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OfferCadence::Month => write!(f, "month"),
            OfferCadence::Year => write!(f, "year"),
        }
    }
}

impl FromStr for OfferCadence {
    type Err = OfferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "month" => Ok(OfferCadence::Month),
            "year" => Ok(OfferCadence::Year),
            _ => Err(OfferError::UnknownValue { kind: "cadence", value: s.to_string() }),
        }
    }
}

impl fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OfferStatus::Active => write!(f, "active"),
            OfferStatus::Archived => write!(f, "archived"),
        }
    }
}

impl FromStr for OfferStatus {
    type Err = OfferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(OfferStatus::Active),
            "archived" => Ok(OfferStatus::Archived),
            _ => Err(OfferError::UnknownValue { kind: "status", value: s.to_string() }),
        }
    }
}

/// How long the discount keeps applying once redeemed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase", tag = "duration")]
pub enum OfferDuration {
    Once,
    Forever,
    Repeating { months: u32 },
}

impl OfferDuration {
    /// Builds a duration from its stored kind plus the optional month count.
    /// The month count is ignored unless the kind is `repeating`.
    pub fn parse(kind: &str, months: Option<u32>) -> Result<Self, OfferError> {
        match kind {
            "once" => Ok(OfferDuration::Once),
            "forever" => Ok(OfferDuration::Forever),
            "repeating" => match months {
                Some(months) => {
                    let duration = OfferDuration::Repeating { months };
                    check_months(duration)?;
                    Ok(duration)
                }
                None => Err(OfferError::InvalidDuration(
                    "repeating offers need a month count".to_string(),
                )),
            },
            _ => Err(OfferError::UnknownValue { kind: "duration", value: kind.to_string() }),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            OfferDuration::Once => "once",
            OfferDuration::Forever => "forever",
            OfferDuration::Repeating { .. } => "repeating",
        }
    }

    pub fn months(&self) -> Option<u32> {
        match self {
            OfferDuration::Repeating { months } => Some(*months),
            _ => None,
        }
    }
}

/// Amount and, for fixed discounts, the currency it is expressed in.
/// Fixed amounts are in the currency's minor unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OfferDiscount {
    Percent(i32),
    Fixed { amount: i32, currency: String },
}

impl OfferDiscount {
    /// A currency passed alongside a percent discount is discarded.
    pub fn new(offer_type: OfferType, amount: i32, currency: Option<String>) -> Result<Self, OfferError> {
        match offer_type {
            OfferType::Percent => {
                if !(1..=100).contains(&amount) {
                    return Err(OfferError::InvalidAmount(format!(
                        "percent discounts must be between 1 and 100, got {}",
                        amount
                    )));
                }
                Ok(OfferDiscount::Percent(amount))
            }
            OfferType::Fixed => {
                if amount <= 0 {
                    return Err(OfferError::InvalidAmount(format!(
                        "fixed discounts must be positive, got {}",
                        amount
                    )));
                }
                let currency = currency.ok_or_else(|| {
                    OfferError::InvalidCurrency("fixed discounts require a currency".to_string())
                })?;
                Ok(OfferDiscount::Fixed { amount, currency: validate_currency(&currency)? })
            }
        }
    }

    pub fn offer_type(&self) -> OfferType {
        match self {
            OfferDiscount::Percent(_) => OfferType::Percent,
            OfferDiscount::Fixed { .. } => OfferType::Fixed,
        }
    }

    pub fn amount(&self) -> i32 {
        match self {
            OfferDiscount::Percent(amount) => *amount,
            OfferDiscount::Fixed { amount, .. } => *amount,
        }
    }

    pub fn currency(&self) -> Option<&str> {
        match self {
            OfferDiscount::Percent(_) => None,
            OfferDiscount::Fixed { currency, .. } => Some(currency),
        }
    }
}

/// The pricing tier an offer discounts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OfferTier {
    pub id: Uuid,
    pub name: String,
}

/// Input for a brand new offer
#[derive(Debug, Clone)]
pub struct OfferCreateInput {
    pub name: String,
    pub code: String,
    pub display_title: String,
    pub display_description: String,
    pub offer_type: OfferType,
    pub amount: i32,
    pub currency: Option<String>,
    pub cadence: OfferCadence,
    pub duration: OfferDuration,
    pub tier: OfferTier,
}

/// Everything needed to rebuild an offer that already exists in storage
#[derive(Debug, Clone)]
pub struct OfferProps {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub display_title: String,
    pub display_description: String,
    pub offer_type: OfferType,
    pub amount: i32,
    pub currency: Option<String>,
    pub cadence: OfferCadence,
    pub duration: OfferDuration,
    pub tier: OfferTier,
    pub status: OfferStatus,
    pub redemption_count: i64,
    pub stripe_coupon_id: Option<String>,
}

/// A discount applied to a subscription tier.
///
/// Discount shape, cadence, duration and tier are fixed at creation because the
/// provider-side coupon cannot be changed afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Offer {
    id: Uuid,
    name: String,
    code: String,
    display_title: String,
    display_description: String,
    discount: OfferDiscount,
    cadence: OfferCadence,
    duration: OfferDuration,
    tier: OfferTier,
    status: OfferStatus,
    redemption_count: i64,
    stripe_coupon_id: Option<String>,
    is_new: bool,
    loaded_code: Option<String>,
}

fn check_months(duration: OfferDuration) -> Result<(), OfferError> {
    match duration {
        OfferDuration::Repeating { months } if !(1..=MAX_DURATION_MONTHS).contains(&months) => {
            Err(OfferError::InvalidDuration(format!(
                "repeating offers run for 1 to {} months, got {}",
                MAX_DURATION_MONTHS, months
            )))
        }
        _ => Ok(()),
    }
}

fn check_duration(duration: OfferDuration, cadence: OfferCadence) -> Result<(), OfferError> {
    check_months(duration)?;
    if matches!(duration, OfferDuration::Repeating { .. }) && cadence != OfferCadence::Month {
        return Err(OfferError::InvalidDuration(
            "repeating offers are only available on monthly cadence".to_string(),
        ));
    }
    Ok(())
}

impl Offer {
    /// Validate input, check name and code are free, and build an unsaved offer.
    pub async fn create(
        input: OfferCreateInput,
        uniqueness: &dyn UniqueChecker,
    ) -> Result<Self, OfferError> {
        let name = validate_name(&input.name)?;
        let code = validate_code(&input.code)?;
        let display_title = validate_display_title(&input.display_title)?;
        let display_description = validate_display_description(&input.display_description)?;
        let discount = OfferDiscount::new(input.offer_type, input.amount, input.currency)?;
        check_duration(input.duration, input.cadence)?;

        if !uniqueness
            .is_unique_name(&name)
            .await
            .map_err(OfferError::UniquenessCheck)?
        {
            return Err(OfferError::NameNotUnique(name));
        }
        if !uniqueness
            .is_unique_code(&code)
            .await
            .map_err(OfferError::UniquenessCheck)?
        {
            return Err(OfferError::CodeNotUnique(code));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            name,
            code,
            display_title,
            display_description,
            discount,
            cadence: input.cadence,
            duration: input.duration,
            tier: input.tier,
            status: OfferStatus::Active,
            redemption_count: 0,
            stripe_coupon_id: None,
            is_new: true,
            loaded_code: None,
        })
    }

    /// Rebuild a persisted offer. Applies the same value rules as `create`
    /// but skips the uniqueness checks.
    pub fn restore(props: OfferProps) -> Result<Self, OfferError> {
        let name = validate_name(&props.name)?;
        let code = validate_code(&props.code)?;
        let display_title = validate_display_title(&props.display_title)?;
        let display_description = validate_display_description(&props.display_description)?;
        let discount = OfferDiscount::new(props.offer_type, props.amount, props.currency)?;
        check_duration(props.duration, props.cadence)?;

        Ok(Self {
            id: props.id,
            name,
            loaded_code: Some(code.clone()),
            code,
            display_title,
            display_description,
            discount,
            cadence: props.cadence,
            duration: props.duration,
            tier: props.tier,
            status: props.status,
            redemption_count: props.redemption_count,
            stripe_coupon_id: props.stripe_coupon_id,
            is_new: false,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn display_title(&self) -> &str {
        &self.display_title
    }

    pub fn display_description(&self) -> &str {
        &self.display_description
    }

    pub fn discount(&self) -> &OfferDiscount {
        &self.discount
    }

    pub fn offer_type(&self) -> OfferType {
        self.discount.offer_type()
    }

    pub fn amount(&self) -> i32 {
        self.discount.amount()
    }

    pub fn currency(&self) -> Option<&str> {
        self.discount.currency()
    }

    pub fn cadence(&self) -> OfferCadence {
        self.cadence
    }

    pub fn duration(&self) -> OfferDuration {
        self.duration
    }

    pub fn tier(&self) -> &OfferTier {
        &self.tier
    }

    pub fn status(&self) -> OfferStatus {
        self.status
    }

    pub fn redemption_count(&self) -> i64 {
        self.redemption_count
    }

    pub fn stripe_coupon_id(&self) -> Option<&str> {
        self.stripe_coupon_id.as_deref()
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Code as it was when the offer was loaded. `None` for unsaved offers.
    pub fn loaded_code(&self) -> Option<&str> {
        self.loaded_code.as_deref()
    }

    /// True for unsaved offers and for offers whose code was edited since loading.
    pub fn code_changed(&self) -> bool {
        self.is_new || self.loaded_code.as_deref() != Some(self.code.as_str())
    }

    pub async fn update_name(
        &mut self,
        name: &str,
        uniqueness: &dyn UniqueChecker,
    ) -> Result<(), OfferError> {
        let name = validate_name(name)?;
        if name == self.name {
            return Ok(());
        }
        if !uniqueness
            .is_unique_name(&name)
            .await
            .map_err(OfferError::UniquenessCheck)?
        {
            return Err(OfferError::NameNotUnique(name));
        }
        self.name = name;
        Ok(())
    }

    pub async fn update_code(
        &mut self,
        code: &str,
        uniqueness: &dyn UniqueChecker,
    ) -> Result<(), OfferError> {
        let code = validate_code(code)?;
        if code == self.code {
            return Ok(());
        }
        if !uniqueness
            .is_unique_code(&code)
            .await
            .map_err(OfferError::UniquenessCheck)?
        {
            return Err(OfferError::CodeNotUnique(code));
        }
        self.code = code;
        Ok(())
    }

    pub fn set_display_title(&mut self, title: &str) -> Result<(), OfferError> {
        self.display_title = validate_display_title(title)?;
        Ok(())
    }

    pub fn set_display_description(&mut self, description: &str) -> Result<(), OfferError> {
        self.display_description = validate_display_description(description)?;
        Ok(())
    }

    pub fn archive(&mut self) {
        self.status = OfferStatus::Archived;
    }

    pub fn activate(&mut self) {
        self.status = OfferStatus::Active;
    }

    /// The coupon id can be attached exactly once.
    pub fn attach_stripe_coupon_id(&mut self, coupon_id: String) -> Result<(), OfferError> {
        if let Some(existing) = &self.stripe_coupon_id {
            return Err(OfferError::CouponAlreadyAttached(existing.clone()));
        }
        self.stripe_coupon_id = Some(coupon_id);
        Ok(())
    }

    /// Called once the offer has been written; later saves are updates.
    pub fn mark_persisted(&mut self) {
        self.is_new = false;
        self.loaded_code = Some(self.code.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::BoxError;
    use async_trait::async_trait;

    struct Taken {
        names: Vec<&'static str>,
        codes: Vec<&'static str>,
    }

    #[async_trait]
    impl UniqueChecker for Taken {
        async fn is_unique_name(&self, name: &str) -> Result<bool, BoxError> {
            Ok(!self.names.contains(&name))
        }

        async fn is_unique_code(&self, code: &str) -> Result<bool, BoxError> {
            Ok(!self.codes.contains(&code))
        }
    }

    fn nothing_taken() -> Taken {
        Taken { names: vec![], codes: vec![] }
    }

    fn input() -> OfferCreateInput {
        OfferCreateInput {
            name: "Spring sale".to_string(),
            code: "spring".to_string(),
            display_title: "20% off".to_string(),
            display_description: "For the first month".to_string(),
            offer_type: OfferType::Percent,
            amount: 20,
            currency: None,
            cadence: OfferCadence::Month,
            duration: OfferDuration::Once,
            tier: OfferTier { id: Uuid::new_v4(), name: "Gold".to_string() },
        }
    }

    fn props() -> OfferProps {
        OfferProps {
            id: Uuid::new_v4(),
            name: "Spring sale".to_string(),
            code: "spring".to_string(),
            display_title: String::new(),
            display_description: String::new(),
            offer_type: OfferType::Fixed,
            amount: 500,
            currency: Some("usd".to_string()),
            cadence: OfferCadence::Year,
            duration: OfferDuration::Forever,
            tier: OfferTier { id: Uuid::new_v4(), name: "Gold".to_string() },
            status: OfferStatus::Active,
            redemption_count: 3,
            stripe_coupon_id: Some("co_123".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_new_offer() {
        let offer = Offer::create(input(), &nothing_taken()).await.unwrap();

        assert!(offer.is_new());
        assert!(offer.code_changed());
        assert_eq!(offer.loaded_code(), None);
        assert_eq!(offer.stripe_coupon_id(), None);
        assert_eq!(offer.redemption_count(), 0);
        assert_eq!(offer.status(), OfferStatus::Active);
        assert_eq!(offer.offer_type(), OfferType::Percent);
        assert_eq!(offer.currency(), None);
    }

    #[tokio::test]
    async fn test_create_rejects_taken_name_and_code() {
        let taken = Taken { names: vec!["Spring sale"], codes: vec![] };
        let result = Offer::create(input(), &taken).await;
        assert!(matches!(result, Err(OfferError::NameNotUnique(_))));

        let taken = Taken { names: vec![], codes: vec!["spring"] };
        let result = Offer::create(input(), &taken).await;
        assert!(matches!(result, Err(OfferError::CodeNotUnique(_))));
    }

    #[tokio::test]
    async fn test_fixed_offer_requires_currency() {
        let mut fixed = input();
        fixed.offer_type = OfferType::Fixed;
        fixed.amount = 500;
        let result = Offer::create(fixed.clone(), &nothing_taken()).await;
        assert!(matches!(result, Err(OfferError::InvalidCurrency(_))));

        fixed.currency = Some("usd".to_string());
        let offer = Offer::create(fixed, &nothing_taken()).await.unwrap();
        assert_eq!(offer.currency(), Some("usd"));
    }

    #[test]
    fn test_percent_offer_ignores_currency() {
        let discount = OfferDiscount::new(OfferType::Percent, 10, Some("usd".to_string())).unwrap();
        assert_eq!(discount, OfferDiscount::Percent(10));
        assert!(OfferDiscount::new(OfferType::Percent, 0, None).is_err());
        assert!(OfferDiscount::new(OfferType::Percent, 101, None).is_err());
        assert!(OfferDiscount::new(OfferType::Fixed, 0, Some("usd".to_string())).is_err());
    }

    #[tokio::test]
    async fn test_repeating_needs_monthly_cadence() {
        let mut yearly = input();
        yearly.cadence = OfferCadence::Year;
        yearly.duration = OfferDuration::Repeating { months: 3 };
        let result = Offer::create(yearly, &nothing_taken()).await;
        assert!(matches!(result, Err(OfferError::InvalidDuration(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_oversized_month_count() {
        let mut long = input();
        long.cadence = OfferCadence::Month;
        long.duration = OfferDuration::Repeating { months: 3_000_000_000 };
        let result = Offer::create(long, &nothing_taken()).await;
        assert!(matches!(result, Err(OfferError::InvalidDuration(_))));
    }

    #[test]
    fn test_duration_parse() {
        assert_eq!(OfferDuration::parse("once", Some(4)).unwrap(), OfferDuration::Once);
        assert_eq!(
            OfferDuration::parse("repeating", Some(4)).unwrap(),
            OfferDuration::Repeating { months: 4 }
        );
        assert!(OfferDuration::parse("repeating", None).is_err());
        assert!(OfferDuration::parse("repeating", Some(0)).is_err());
        assert!(OfferDuration::parse("repeating", Some(MAX_DURATION_MONTHS)).is_ok());
        assert!(matches!(
            OfferDuration::parse("repeating", Some(3_000_000_000)),
            Err(OfferError::InvalidDuration(_))
        ));
        assert!(OfferDuration::parse("weekly", None).is_err());
    }

    #[tokio::test]
    async fn test_restored_offer_tracks_code_changes() {
        let mut offer = Offer::restore(props()).unwrap();
        assert!(!offer.is_new());
        assert!(!offer.code_changed());

        offer.update_code("summer", &nothing_taken()).await.unwrap();
        assert!(offer.code_changed());
        assert_eq!(offer.loaded_code(), Some("spring"));

        offer.mark_persisted();
        assert!(!offer.code_changed());
        assert_eq!(offer.loaded_code(), Some("summer"));
    }

    #[tokio::test]
    async fn test_update_to_same_code_skips_uniqueness() {
        let mut offer = Offer::restore(props()).unwrap();
        let taken = Taken { names: vec!["Spring sale"], codes: vec!["spring"] };

        offer.update_code("spring", &taken).await.unwrap();
        offer.update_name("Spring sale", &taken).await.unwrap();
        assert!(!offer.code_changed());
        assert!(offer.update_code("taken", &Taken { names: vec![], codes: vec!["taken"] }).await.is_err());
    }

    #[test]
    fn test_coupon_id_attaches_once() {
        let mut p = props();
        p.stripe_coupon_id = None;
        let mut offer = Offer::restore(p).unwrap();

        offer.attach_stripe_coupon_id("co_1".to_string()).unwrap();
        let second = offer.attach_stripe_coupon_id("co_2".to_string());
        assert!(matches!(second, Err(OfferError::CouponAlreadyAttached(id)) if id == "co_1"));
        assert_eq!(offer.stripe_coupon_id(), Some("co_1"));
    }

    #[test]
    fn test_archive_and_activate() {
        let mut offer = Offer::restore(props()).unwrap();
        offer.archive();
        assert_eq!(offer.status(), OfferStatus::Archived);
        offer.activate();
        assert_eq!(offer.status(), OfferStatus::Active);
    }

    #[test]
    fn test_enum_strings() {
        assert_eq!("fixed".parse::<OfferType>().unwrap(), OfferType::Fixed);
        assert_eq!(OfferCadence::Year.to_string(), "year");
        assert_eq!("archived".parse::<OfferStatus>().unwrap(), OfferStatus::Archived);
        assert!("amount".parse::<OfferType>().is_err());
    }
}
