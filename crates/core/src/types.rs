/// Local catalog ids are WordPress post / term ids.
pub type EntityId = i64;

/// Remote catalog ids are opaque numeric strings.
pub type RemoteId = String;
