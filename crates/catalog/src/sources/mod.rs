mod dictionaries;
mod lookup;
mod profiles;

pub use self::dictionaries::{Dictionary, DictionaryIndex};
pub use self::profiles::{Profile, ProfileSource};
pub(crate) use self::profiles::PROFILE_EXTENSION;
