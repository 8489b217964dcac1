use std::fmt;

/// A tag identifier used by positional or tag-ordered encodings.
pub trait TagKey: Clone + Eq + fmt::Debug {
    /// Wire code of the tag.
    fn code(&self) -> &str;
    /// Longest value the networks accept for this tag.
    fn max_len(&self) -> usize;
}

/// Ordered mapping from tag to value.
///
/// Iteration follows insertion order, which is the serialized order for
/// networks that encode tags positionally. Keys are unique by wire code, so
/// re-inserting a key (or an `Other` key spelling the same code) replaces
/// its value in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagData<K> {
    entries: Vec<(K, String)>,
}

impl<K> Default for TagData<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K: TagKey> TagData<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites a tag, returning the replaced value.
    pub fn insert(&mut self, key: K, value: impl Into<String>) -> Option<String> {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k.code() == key.code()) {
            Some((existing_key, existing)) => {
                // A named tag and an `Other` spelling of it keep the stricter limit.
                if key.max_len() < existing_key.max_len() {
                    *existing_key = key;
                }
                Some(std::mem::replace(existing, value))
            }
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &K) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.code() == key.code())
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &str)> {
        self.entries.iter().map(|(k, v)| (k, v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: TagKey, V: Into<String>> FromIterator<(K, V)> for TagData<K> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut data = Self::new();
        for (key, value) in iter {
            data.insert(key, value);
        }
        data
    }
}

/// Card-issuer entry tags.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IssuerTag {
    StoredValueCards,
    SwipeIndicator,
    PosSequenceNumber,
    RetrievalReferenceNumber,
    ApprovalCode,
    NtsTag16,
    Other(String),
}

impl TagKey for IssuerTag {
    fn code(&self) -> &str {
        match self {
            IssuerTag::StoredValueCards => "SVC",
            IssuerTag::SwipeIndicator => "SWI",
            IssuerTag::PosSequenceNumber => "PSN",
            IssuerTag::RetrievalReferenceNumber => "RRN",
            IssuerTag::ApprovalCode => "APR",
            IssuerTag::NtsTag16 => "T16",
            IssuerTag::Other(code) => code,
        }
    }

    fn max_len(&self) -> usize {
        match self {
            IssuerTag::SwipeIndicator => 1,
            IssuerTag::PosSequenceNumber => 6,
            IssuerTag::ApprovalCode => 6,
            IssuerTag::RetrievalReferenceNumber => 12,
            IssuerTag::NtsTag16 => 20,
            IssuerTag::StoredValueCards | IssuerTag::Other(_) => 99,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProductTag {
    ProductCode,
    Quantity,
    UnitPrice,
    Amount,
    ServiceLevel,
    Other(String),
}

impl TagKey for ProductTag {
    fn code(&self) -> &str {
        match self {
            ProductTag::ProductCode => "PCD",
            ProductTag::Quantity => "QTY",
            ProductTag::UnitPrice => "UPR",
            ProductTag::Amount => "AMT",
            ProductTag::ServiceLevel => "SVL",
            ProductTag::Other(code) => code,
        }
    }

    fn max_len(&self) -> usize {
        match self {
            ProductTag::ProductCode => 3,
            ProductTag::ServiceLevel => 1,
            ProductTag::Quantity | ProductTag::UnitPrice | ProductTag::Amount => 9,
            ProductTag::Other(_) => 99,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FleetTag {
    Odometer,
    DriverId,
    VehicleNumber,
    JobNumber,
    DepartmentNumber,
    UserData,
    Other(String),
}

impl TagKey for FleetTag {
    fn code(&self) -> &str {
        match self {
            FleetTag::Odometer => "ODO",
            FleetTag::DriverId => "DRV",
            FleetTag::VehicleNumber => "VEH",
            FleetTag::JobNumber => "JOB",
            FleetTag::DepartmentNumber => "DPT",
            FleetTag::UserData => "USR",
            FleetTag::Other(code) => code,
        }
    }

    fn max_len(&self) -> usize {
        match self {
            FleetTag::Odometer => 7,
            FleetTag::DriverId | FleetTag::VehicleNumber => 17,
            FleetTag::JobNumber | FleetTag::DepartmentNumber => 10,
            FleetTag::UserData | FleetTag::Other(_) => 40,
        }
    }
}

pub type IssuerData = TagData<IssuerTag>;
pub type ProductData = TagData<ProductTag>;
pub type FleetData = TagData<FleetTag>;
