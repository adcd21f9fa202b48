/// Stable page identifier assigned by the dump source.
/// Example: `592` for the article "Physics".
pub type PageId = i64;
/// Surface text of a label (anchor text, title, or redirect title).
/// Examples: `Mercury`, `City of Paris`
pub type LabelText = String;
/// Page title as it appears after normalization.
/// Examples: `Fundamental categories`, `Physics`
pub type Title = String;
/// Language code selecting an entry in the language configuration file.
/// Examples: `en`, `de`
pub type LanguageCode = String;
/// Name of a persisted stage counter.
/// Examples: `unforwarded`, `ambiguous`
pub type CounterName = String;
/// Zero-based index of a sentence within a page's text.
pub type SentenceIndex = i32;
