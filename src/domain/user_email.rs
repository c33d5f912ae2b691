use validator::ValidateEmail;

#[derive(Debug, Clone)]
pub struct UserEmail(pub String);

impl UserEmail {
    // Emails are compared case-insensitively, so they are stored lowercased
    pub fn parse(email: String) -> Result<UserEmail, String>{
        let normalized = email.trim().to_lowercase();

        if normalized.validate_email(){
            Ok(Self(normalized))
        } else {
            Err(format!("{} is not a valid user email", email))
        }
    }

    pub fn inner(&self) -> String{
        self.0.clone()
    }
}

impl AsRef<str> for UserEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::UserEmail;
    use claim::{assert_err, assert_ok};
    use fake::faker::internet::en::SafeEmail;
    use fake::Fake;
    use rand::{rngs::StdRng, SeedableRng};

    #[derive(Debug, Clone)]
    struct ValidEmailFixture(pub String);

    impl quickcheck::Arbitrary for ValidEmailFixture {
        fn arbitrary(g: &mut quickcheck::Gen) -> Self {
            let mut rng = StdRng::seed_from_u64(u64::arbitrary(g));
            let email = SafeEmail().fake_with_rng(&mut rng);
            Self(email)
        }
    }

    #[test]
    fn empty_string_is_rejected(){
        assert_err!(UserEmail::parse("".to_string()));
    }

    #[test]
    fn email_missing_at_symbol_is_rejected(){
        assert_err!(UserEmail::parse("buyer.example.com".to_string()));
    }

    #[test]
    fn email_missing_subject_is_rejected(){
        assert_err!(UserEmail::parse("@example.com".to_string()));
    }

    #[test]
    fn email_is_trimmed_and_lowercased(){
        let email = UserEmail::parse("  Vendor@Bazaar.Example ".to_string()).unwrap();
        assert_eq!(email.as_ref(), "vendor@bazaar.example");
    }

    #[quickcheck_macros::quickcheck]
    fn valid_emails_are_parsed_successfully(valid_email: ValidEmailFixture) -> bool {
        UserEmail::parse(valid_email.0).is_ok()
    }

    #[test]
    fn parsed_email_keeps_normalized_value(){
        let email = assert_ok!(UserEmail::parse("buyer@example.com".to_string()));
        assert_eq!(email.inner(), "buyer@example.com");
    }
}
