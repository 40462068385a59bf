use crate::utils::error::ConfigurationError;

/// Allow-list of supported countries and the catalog locale each one maps to.
const COUNTRY_LOCALES: &[(&str, &str)] = &[
    ("AE", "ara-ae"),
    ("AT", "eng-nl"),
    ("AU", "eng-au"),
    ("BE", "eng-nl"),
    ("BR", "por-br"),
    ("CA", "eng-ca"),
    ("CN", "zhs-cn"),
    ("DE", "deu-de"),
    ("DK", "eng-nl"),
    ("ES", "esp-es"),
    ("FI", "eng-nl"),
    ("FR", "fra-fr"),
    ("HK", "eng-hk"),
    ("IE", "eng-nl"),
    ("IT", "ita-it"),
    ("JP", "jpn-jp"),
    ("KR", "kor-kr"),
    ("KW", "eng-ae"),
    ("LU", "eng-nl"),
    ("MC", "eng-nl"),
    ("MX", "esp-mx"),
    ("NL", "eng-nl"),
    ("NZ", "eng-sg"),
    ("QA", "eng-ae"),
    ("RU", "rus-ru"),
    ("SA", "eng-ae"),
    ("SE", "eng-nl"),
    ("SG", "eng-sg"),
    ("TH", "tha-th"),
    ("TW", "zht-tw"),
    ("UK", "eng-gb"),
    ("US", "eng-us"),
];

/// A validated two-letter country code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Country {
    code: String,
    locale: String,
}

impl Country {
    /// Parses a country code in any case, rejecting anything off the allow-list.
    pub fn parse(input: &str) -> Result<Self, ConfigurationError> {
        let code = input.trim().to_uppercase();
        let locale = (code.len() == 2)
            .then(|| lookup_locale(&code))
            .flatten()
            .ok_or_else(|| ConfigurationError::InvalidCountry {
                code: input.to_string(),
                allowed: Self::allowed().join(", "),
            })?;

        Ok(Self {
            code,
            locale: locale.to_string(),
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Catalog locale used when querying availability, e.g. `eng-nl`.
    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn allowed() -> Vec<&'static str> {
        COUNTRY_LOCALES.iter().map(|(code, _)| *code).collect()
    }
}

fn lookup_locale(code: &str) -> Option<&'static str> {
    COUNTRY_LOCALES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, locale)| *locale)
}
