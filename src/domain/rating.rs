use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Rating(i32);

impl Rating {
    pub fn parse(value: i32) -> Result<Rating, String>{
        if (1..=5).contains(&value) {
            Ok(Rating(value))
        } else {
            Err(format!("rating must be between 1 and 5, got {}", value))
        }
    }

    pub fn get(&self) -> i32{
        self.0
    }
}

impl TryFrom<i32> for Rating {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Rating::parse(value)
    }
}

impl From<Rating> for i32 {
    fn from(value: Rating) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::Rating;

    #[quickcheck_macros::quickcheck]
    fn only_one_through_five_are_ratings(value: i32) -> bool {
        Rating::parse(value).is_ok() == (1..=5).contains(&value)
    }
}
