// src/config/seed.rs
//! Built-in keyword banks. `config/curation.toml` ships the same lists; these are
//! used when no config file is present and as serde defaults for omitted keys.

use std::collections::BTreeMap;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub(crate) fn high_relevance() -> Vec<String> {
    strings(&[
        // visas & immigration
        "visa",
        "titre de séjour",
        "carte de séjour",
        "naturalisation",
        "immigration",
        "étranger",
        // work & salary
        "smic",
        "salaire",
        "cotisations",
        "code du travail",
        "congé",
        "prélèvement à la source",
        // housing & cost of living
        "loyer",
        "caf",
        "apl",
        "logement",
        "bail",
        "pouvoir d'achat",
        // transport
        "grève",
        "sncf",
        "ratp",
        "trafic",
        "panne",
        // health & social security
        "sécurité sociale",
        "ameli",
        "mutuelle",
        "assurance maladie",
        "carte vitale",
        // civic & admin
        "politique",
        "économie",
        "justice",
        "santé",
        "écologie",
        "assurance habitation",
        "taxe d'habitation",
        "doctolib",
        "carte navigo",
    ])
}

pub(crate) fn medium_relevance() -> Vec<String> {
    strings(&[
        "retraite",
        "impôts",
        "urssaf",
        "énergie",
        "inflation",
        "prix",
        "taxe foncière",
        "jeux olympiques",
        "olympiques",
        "élections",
        "élection",
        "météo",
        "grève nationale",
        "canicule",
        "tempête",
        "sécheresse",
    ])
}

pub(crate) fn national_terms() -> Vec<String> {
    strings(&["france", "français", "française", "french"])
}

pub(crate) fn breaking_terms() -> Vec<String> {
    strings(&[
        "urgent",
        "alerte",
        "breaking",
        "attentat",
        "explosion",
        "séisme",
        "earthquake",
        "évacuation",
        "crise",
        "crisis",
    ])
}

pub(crate) fn geopolitical_patterns() -> Vec<String> {
    strings(&[
        "guerre en ukraine",
        "war in ukraine",
        "cessez-le-feu",
        "conseil de sécurité",
        "security council",
        "union européenne",
        "european union",
        "sommet du g7",
        "bande de gaza",
        "maison blanche",
        "white house",
    ])
}

pub(crate) fn money_pattern() -> String {
    concat!(
        r"(?i)(\d[\d\s.,]*\s?[€$£]|[€$£]\s?\d|",
        r"\d[\d\s.,]*\s?(euros?|dollars?|millions?|milliards?|billions?)\b)"
    )
    .to_string()
}

pub(crate) fn date_pattern() -> String {
    concat!(
        r"(?i)\b(\d{1,2}/\d{1,2}/\d{2,4}|\d{4}-\d{2}-\d{2}|",
        r"(1er|\d{1,2})\s+(janvier|février|mars|avril|mai|juin|juillet|août|septembre|octobre|novembre|décembre)|",
        r"(lundi|mardi|mercredi|jeudi|vendredi|samedi|dimanche|monday|tuesday|wednesday|thursday|friday|saturday|sunday)|",
        r"(january|february|march|april|june|july|august|september|october|november|december)\s+\d{1,2})\b"
    )
    .to_string()
}

pub(crate) fn percent_pattern() -> String {
    r"(?i)\d+([.,]\d+)?\s?(%|pour ?cent\b|percent\b)".to_string()
}

pub(crate) fn org_pattern() -> String {
    r"\b([A-Z]{2,6}|[Mm]inistère|[Gg]ouvernement|[Mm]inistry|[Gg]overnment|[Cc]ommission|[Aa]ssemblée nationale|[Ss]énat)\b"
        .to_string()
}

pub(crate) fn stopwords() -> Vec<String> {
    strings(&[
        // French
        "le", "la", "les", "un", "une", "des", "du", "de", "d", "l", "à", "au", "aux", "et",
        "ou", "en", "dans", "sur", "pour", "par", "avec", "sans", "ce", "ces", "cet", "cette",
        "qui", "que", "quoi", "dont", "est", "sont", "a", "ont", "été", "être", "pas", "ne",
        "plus", "se", "son", "sa", "ses", "leur", "leurs", "il", "elle", "ils", "elles", "on",
        "nous", "vous", "après", "avant", "selon", "entre", "contre", "vers", "comme",
        // English
        "the", "an", "and", "or", "of", "to", "in", "on", "for", "by", "with", "without", "at",
        "from", "is", "are", "was", "were", "be", "been", "it", "its", "this", "that", "these",
        "those", "as", "not", "no", "after", "before", "over", "into", "about", "his", "her",
        "their", "he", "she", "they", "we", "you",
    ])
}

/// topic → subtopic → keywords
pub(crate) fn topics() -> BTreeMap<String, BTreeMap<String, Vec<String>>> {
    let table: &[(&str, &[(&str, &[&str])])] = &[
        (
            "politics",
            &[
                ("elections", &["élection", "élections", "législative", "législatives", "scrutin", "election"]),
                ("government", &["gouvernement", "premier ministre", "assemblée nationale", "sénat", "government"]),
            ],
        ),
        (
            "economy",
            &[
                ("prices", &["inflation", "prix", "pouvoir d'achat", "prices"]),
                ("jobs", &["chômage", "emploi", "salaire", "smic", "unemployment"]),
                ("taxes", &["impôts", "taxe", "tax"]),
            ],
        ),
        (
            "transport",
            &[
                ("strikes", &["grève", "strike"]),
                ("rail", &["sncf", "ratp", "tgv", "métro", "rer"]),
            ],
        ),
        (
            "weather_heat",
            &[
                ("heatwave", &["canicule", "heat wave", "heatwave", "vague de chaleur"]),
                ("drought", &["sécheresse", "drought"]),
            ],
        ),
        (
            "weather_storm",
            &[("storm", &["tempête", "orage", "inondation", "storm", "flood"])],
        ),
        (
            "health",
            &[
                ("system", &["hôpital", "assurance maladie", "sécurité sociale", "ameli", "hospital"]),
                ("epidemic", &["épidémie", "covid", "grippe", "vaccin"]),
            ],
        ),
        (
            "immigration",
            &[("papers", &["visa", "titre de séjour", "naturalisation", "immigration"])],
        ),
        (
            "housing",
            &[("rent", &["loyer", "logement", "apl", "caf", "rent", "housing"])],
        ),
        (
            "tech",
            &[
                ("ai", &["intelligence artificielle", "ia", "chatgpt", "artificial intelligence"]),
                ("industry", &["numérique", "startup", "start-up", "tech", "cybersécurité"]),
            ],
        ),
        (
            "sport",
            &[
                ("football", &["football", "ligue 1", "psg", "ballon d'or"]),
                ("events", &["jeux olympiques", "olympiques", "tour de france", "roland-garros", "coupe du monde"]),
                ("general", &["sport", "match"]),
            ],
        ),
        (
            "culture",
            &[("arts", &["cinéma", "musique", "festival", "musée", "exposition"])],
        ),
        (
            "global",
            &[
                ("conflict", &["ukraine", "russie", "gaza", "israël", "guerre", "war"]),
                ("diplomacy", &["onu", "otan", "nato", "g7", "g20", "union européenne", "maison blanche"]),
            ],
        ),
    ];

    table
        .iter()
        .map(|(topic, subs)| {
            let inner = subs
                .iter()
                .map(|(sub, kws)| (sub.to_string(), strings(kws)))
                .collect();
            (topic.to_string(), inner)
        })
        .collect()
}

/// marker name → keywords
pub(crate) fn location_markers() -> BTreeMap<String, Vec<String>> {
    [
        ("paris", &["paris", "île-de-france", "parisien", "parisienne"][..]),
        ("lyon", &["lyon", "lyonnais"][..]),
        ("marseille", &["marseille", "marseillais"][..]),
        ("bordeaux", &["bordeaux"][..]),
        ("lille", &["lille"][..]),
        ("toulouse", &["toulouse"][..]),
    ]
    .iter()
    .map(|(name, kws)| (name.to_string(), strings(kws)))
    .collect()
}

pub(crate) fn urgency_markers() -> Vec<String> {
    strings(&["urgent", "alerte", "dernière minute", "breaking", "en direct", "live"])
}

pub(crate) fn work_tech_bucket() -> Vec<String> {
    strings(&[
        "tech",
        "numérique",
        "startup",
        "start-up",
        "intelligence artificielle",
        "ia",
        "emploi",
        "travail",
        "télétravail",
        "salaire",
        "smic",
        "code du travail",
        "cybersécurité",
        "énergie",
    ])
}

pub(crate) fn global_breaking_bucket() -> Vec<String> {
    strings(&[
        "ukraine",
        "russie",
        "gaza",
        "guerre",
        "otan",
        "onu",
        "union européenne",
        "maison blanche",
        "urgent",
        "alerte",
        "breaking",
        "séisme",
    ])
}
