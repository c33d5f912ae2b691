use serde::{Deserialize, Serialize};

pub const MAX_LINE_QUANTITY: i32 = 10_000;

/// Quantity of a single cart or order line. Always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Quantity(i32);

impl Quantity {
    pub const ONE: Quantity = Quantity(1);

    pub fn parse(value: i32) -> Result<Quantity, String>{
        if value < 1 {
            Err(format!("quantity must be at least 1, got {}", value))
        } else if value > MAX_LINE_QUANTITY {
            Err(format!("quantity must not exceed {}, got {}", MAX_LINE_QUANTITY, value))
        } else {
            Ok(Quantity(value))
        }
    }

    pub fn get(&self) -> i32{
        self.0
    }

    /// Clamps any value into the valid range
    pub fn saturating(value: i32) -> Quantity{
        Quantity(value.clamp(1, MAX_LINE_QUANTITY))
    }

    /// Adds two quantities, capping at the per-line maximum. Repeated adds to
    /// one cart line stop summing at [`MAX_LINE_QUANTITY`]; the server upsert
    /// and the guest cart both merge this way.
    pub fn saturating_add(self, other: Quantity) -> Quantity{
        Quantity(self.0.saturating_add(other.0).min(MAX_LINE_QUANTITY))
    }
}

impl TryFrom<i32> for Quantity {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Quantity::parse(value)
    }
}

impl From<Quantity> for i32 {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claim::{assert_err, assert_ok};

    #[test]
    fn zero_and_negative_quantities_are_rejected(){
        assert_err!(Quantity::parse(0));
        assert_err!(Quantity::parse(-4));
    }

    #[test]
    fn quantity_above_line_maximum_is_rejected(){
        assert_err!(Quantity::parse(MAX_LINE_QUANTITY + 1));
        assert_ok!(Quantity::parse(MAX_LINE_QUANTITY));
    }

    #[test]
    fn saturating_add_caps_at_maximum(){
        let big = Quantity::parse(MAX_LINE_QUANTITY - 1).unwrap();
        assert_eq!(big.saturating_add(Quantity::parse(5).unwrap()).get(), MAX_LINE_QUANTITY);
    }

    #[test]
    fn saturating_clamps_into_range(){
        assert_eq!(Quantity::saturating(-3), Quantity::ONE);
        assert_eq!(Quantity::saturating(MAX_LINE_QUANTITY * 2).get(), MAX_LINE_QUANTITY);
    }

    #[test]
    fn deserializing_zero_fails(){
        assert_err!(serde_json::from_str::<Quantity>("0"));
        assert_eq!(serde_json::from_str::<Quantity>("3").unwrap().get(), 3);
    }
}
