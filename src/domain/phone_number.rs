use std::fmt::Debug;

use phonenumber::{country, Mode};

// Phone numbers without a country prefix are read as Kenyan numbers
#[derive(Debug, Clone)]
pub struct PhoneNumberDomain(pub String);

impl PhoneNumberDomain{
    pub fn parse(number: String) -> Result<PhoneNumberDomain, String>{
        match phonenumber::parse(Some(country::KE), &number) {
            Ok(parsed) if parsed.is_valid() => {
                Ok(Self(parsed.format().mode(Mode::E164).to_string()))
            },
            _ => Err(format!("{} is not a valid phone number", number))
        }
    }

    pub fn inner(&self) -> String {
        self.0.clone()
    }
}

impl std::fmt::Display for PhoneNumberDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::PhoneNumberDomain;
    use claim::{assert_err, assert_ok};

    #[test]
    fn international_number_is_accepted(){
        let phone = assert_ok!(PhoneNumberDomain::parse("+254712345678".to_string()));
        assert_eq!(phone.inner(), "+254712345678");
    }

    #[test]
    fn local_number_is_normalized_to_e164(){
        let phone = assert_ok!(PhoneNumberDomain::parse("0712345678".to_string()));
        assert_eq!(phone.inner(), "+254712345678");
    }

    #[test]
    fn garbage_is_rejected(){
        assert_err!(PhoneNumberDomain::parse("not a number".to_string()));
        assert_err!(PhoneNumberDomain::parse("123".to_string()));
    }
}
