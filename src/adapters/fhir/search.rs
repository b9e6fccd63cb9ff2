//! Search parameters for type-level searches

use crate::domain::FhirError;

/// Search criteria and result controls
///
/// # Example
///
/// ```
/// use fhir_rest_client::adapters::fhir::SearchParams;
///
/// let params = SearchParams::new()
///     .criterion("name", "Eve")
///     .include("Patient:organization")
///     .count(10);
///
/// assert_eq!(
///     params.to_pairs(),
///     vec![
///         ("name".to_string(), "Eve".to_string()),
///         ("_include".to_string(), "Patient:organization".to_string()),
///         ("_count".to_string(), "10".to_string()),
///     ]
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    criteria: Vec<(String, String)>,
    ids: Vec<String>,
    includes: Vec<String>,
    sort: Vec<String>,
    count: Option<u32>,
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `name=value` criteria as typed on a command line
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::InvalidSearch`] when a criterion has no `=` or
    /// an empty name.
    pub fn from_criteria<S: AsRef<str>>(criteria: &[S]) -> Result<Self, FhirError> {
        let mut params = Self::new();
        for raw in criteria {
            let raw = raw.as_ref();
            let (name, value) = raw.split_once('=').ok_or_else(|| {
                FhirError::InvalidSearch(format!("criterion '{raw}' must have the form name=value"))
            })?;
            let name = name.trim();
            if name.is_empty() {
                return Err(FhirError::InvalidSearch(format!(
                    "criterion '{raw}' has an empty parameter name"
                )));
            }
            params = match name {
                "_id" => params.id(value),
                "_include" => params.include(value),
                "_sort" => params.sort(value),
                "_count" => {
                    let count = value.trim().parse().map_err(|_| {
                        FhirError::InvalidSearch(format!("_count '{value}' is not a number"))
                    })?;
                    params.count(count)
                }
                _ => params.criterion(name, value),
            };
        }
        Ok(params)
    }

    /// Adds a search criterion; repeated names are sent as repeated parameters
    pub fn criterion(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.criteria.push((name.into(), value.into()));
        self
    }

    /// Restricts the search to a logical id (`_id`)
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.ids.push(id.into());
        self
    }

    /// Asks the server to include referenced resources (`_include`)
    pub fn include(mut self, path: impl Into<String>) -> Self {
        self.includes.push(path.into());
        self
    }

    pub fn sort(mut self, field: impl Into<String>) -> Self {
        self.sort.push(field.into());
        self
    }

    /// Page size (`_count`)
    pub fn count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
            && self.ids.is_empty()
            && self.includes.is_empty()
            && self.sort.is_empty()
            && self.count.is_none()
    }

    /// Whether any parameter narrows the matched set
    ///
    /// `_include`, `_sort` and `_count` shape the result but match every
    /// resource of the type.
    pub fn has_filters(&self) -> bool {
        !self.criteria.is_empty() || !self.ids.is_empty()
    }

    /// Query parameters in the order they are sent
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = self.criteria.clone();
        pairs.extend(self.ids.iter().map(|id| ("_id".to_string(), id.clone())));
        pairs.extend(
            self.includes
                .iter()
                .map(|path| ("_include".to_string(), path.clone())),
        );
        pairs.extend(self.sort.iter().map(|f| ("_sort".to_string(), f.clone())));
        if let Some(count) = self.count {
            pairs.push(("_count".to_string(), count.to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn pair(name: &str, value: &str) -> (String, String) {
        (name.to_string(), value.to_string())
    }

    #[test]
    fn test_pairs_order() {
        let params = SearchParams::new()
            .count(5)
            .sort("birthdate")
            .include("DiagnosticReport:subject")
            .id("pat1")
            .criterion("family", "Chalmers")
            .criterion("given", "Peter");

        assert_eq!(
            params.to_pairs(),
            vec![
                pair("family", "Chalmers"),
                pair("given", "Peter"),
                pair("_id", "pat1"),
                pair("_include", "DiagnosticReport:subject"),
                pair("_sort", "birthdate"),
                pair("_count", "5"),
            ]
        );
    }

    #[test]
    fn test_from_criteria() {
        let params =
            SearchParams::from_criteria(&["name=Eve", "_count=20", "identifier=urn:sys|1=2"])
                .unwrap();
        assert_eq!(
            params.to_pairs(),
            vec![
                pair("name", "Eve"),
                pair("identifier", "urn:sys|1=2"),
                pair("_count", "20"),
            ]
        );
    }

    #[test_case("name" ; "missing equals")]
    #[test_case("=Eve" ; "empty name")]
    #[test_case("_count=ten" ; "non numeric count")]
    fn test_from_criteria_rejects(criterion: &str) {
        assert!(matches!(
            SearchParams::from_criteria(&[criterion]),
            Err(FhirError::InvalidSearch(_))
        ));
    }

    #[test]
    fn test_empty() {
        assert!(SearchParams::new().is_empty());
        assert!(!SearchParams::new().include("Patient:link").is_empty());
    }

    #[test]
    fn test_has_filters() {
        assert!(!SearchParams::new().has_filters());
        assert!(!SearchParams::new()
            .count(10)
            .sort("birthdate")
            .include("Patient:organization")
            .has_filters());
        assert!(SearchParams::new().id("pat1").has_filters());
        assert!(SearchParams::new().criterion("identifier", "a|b").has_filters());
    }
}
