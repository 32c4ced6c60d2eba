//! Configuration management for the resume screener

use crate::error::{Result, ScreenerError};
use crate::processing::similarity::FuzzyAlgorithm;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub vocabulary: VocabularyConfig,
    pub matching: MatchingConfig,
    pub signals: SignalConfig,
    pub scoring: ScoringConfig,
    pub contacts: ContactConfig,
    pub extraction: ExtractionConfig,
    pub batch: BatchConfig,
    pub output: OutputConfig,
}

/// Canonical skill name -> alias strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyConfig {
    pub skills: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub algorithm: FuzzyAlgorithm,
    /// Minimum similarity (0-100) for a fuzzy match to be accepted
    pub fuzzy_threshold: f64,
    /// Phrases shorter than this many characters are never fuzzy matched
    pub fuzzy_min_length: usize,
    /// Upper bound on the n-gram length used for candidate phrases
    pub max_ngram: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub experience_keywords: Vec<String>,
    /// Canonical degree label -> textual variants
    pub education: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub education_bonus: f64,
    pub experience_bonus: f64,
    /// Maximum bonus for full mandatory coverage
    pub coverage_bonus: f64,
    pub thresholds: DecisionThresholds,
    pub bands: Vec<BandConfig>,
}

/// One row of the score band table.
///
/// The base score for `T` matched skills is
/// `min(base_floor + (T - min_matches) * step, base_ceiling)`; bonuses are
/// added on top and the result is capped at `score_cap`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandConfig {
    pub name: String,
    pub min_matches: usize,
    pub base_floor: f64,
    pub step: f64,
    pub base_ceiling: f64,
    pub score_cap: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionThresholds {
    pub excellent: f64,
    pub good: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactConfig {
    pub phone_pattern: String,
    pub min_phone_digits: usize,
    pub max_phone_digits: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Average non-whitespace characters per page required to trust the text layer
    pub min_chars_per_page: usize,
    pub ocr_enabled: bool,
    pub ocr_dpi: u32,
    pub max_ocr_pages: usize,
    pub ocr_language: String,
    pub pdftoppm_path: PathBuf,
    pub tesseract_path: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Worker count; defaults to the number of available CPU cores
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub detailed: bool,
    pub color_output: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OutputFormat {
    Console,
    Json,
    Markdown,
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            skills: default_skills(),
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            algorithm: FuzzyAlgorithm::Levenshtein,
            fuzzy_threshold: 85.0,
            fuzzy_min_length: 4,
            max_ngram: 4,
        }
    }
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            experience_keywords: to_strings(&[
                "years of experience",
                "years experience",
                "yrs experience",
                "yrs of experience",
                "work experience",
                "professional experience",
                "employment history",
                "internship",
            ]),
            education: default_degrees(),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            education_bonus: 3.0,
            experience_bonus: 2.0,
            coverage_bonus: 4.0,
            thresholds: DecisionThresholds::default(),
            bands: vec![
                BandConfig {
                    name: "Weak".to_string(),
                    min_matches: 0,
                    base_floor: 0.0,
                    step: 35.0,
                    base_ceiling: 35.0,
                    score_cap: 59.0,
                },
                BandConfig {
                    name: "Good".to_string(),
                    min_matches: 2,
                    base_floor: 60.0,
                    step: 20.0,
                    base_ceiling: 80.0,
                    score_cap: 89.0,
                },
                BandConfig {
                    name: "Excellent".to_string(),
                    min_matches: 4,
                    base_floor: 90.0,
                    step: 2.5,
                    base_ceiling: 100.0,
                    score_cap: 100.0,
                },
            ],
        }
    }
}

impl Default for DecisionThresholds {
    fn default() -> Self {
        Self {
            excellent: 90.0,
            good: 60.0,
        }
    }
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            phone_pattern: r"(?:\+\d{1,3}[\s.-]?)?(?:\(\d{1,4}\)[\s.-]?)?\d{2,4}(?:[\s.-]?\d{2,4}){1,3}"
                .to_string(),
            min_phone_digits: 7,
            max_phone_digits: 15,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_chars_per_page: 20,
            ocr_enabled: true,
            ocr_dpi: 200,
            max_ocr_pages: 30,
            ocr_language: "eng".to_string(),
            pdftoppm_path: PathBuf::from("pdftoppm"),
            tesseract_path: PathBuf::from("tesseract"),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Console,
            detailed: false,
            color_output: true,
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from the default location.
    ///
    /// An explicit path must exist. The default location is created with
    /// default contents on first use.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let config_path = Self::config_path();
                if config_path.exists() {
                    Self::load_from(&config_path)
                } else {
                    let config = Self::default();
                    config.save_to(&config_path)?;
                    Ok(config)
                }
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ScreenerError::Configuration(format!(
                "Failed to read config '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| {
            ScreenerError::Configuration(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("resume-screener")
            .join("config.toml")
    }

    /// Check numeric settings and the band table. Vocabulary and pattern
    /// problems are reported when the pipeline builds them.
    pub fn validate(&self) -> Result<()> {
        let threshold = self.matching.fuzzy_threshold;
        if !threshold.is_finite() || !(0.0..=100.0).contains(&threshold) {
            return Err(ScreenerError::Configuration(format!(
                "matching.fuzzy_threshold must be within 0..=100, got {}",
                threshold
            )));
        }
        if self.matching.max_ngram == 0 {
            return Err(ScreenerError::Configuration(
                "matching.max_ngram must be at least 1".to_string(),
            ));
        }
        if self.extraction.max_ocr_pages == 0 || self.extraction.ocr_dpi == 0 {
            return Err(ScreenerError::Configuration(
                "extraction.max_ocr_pages and extraction.ocr_dpi must be positive".to_string(),
            ));
        }
        if self.contacts.min_phone_digits > self.contacts.max_phone_digits {
            return Err(ScreenerError::Configuration(
                "contacts.min_phone_digits exceeds contacts.max_phone_digits".to_string(),
            ));
        }
        if self.batch.workers == Some(0) {
            return Err(ScreenerError::Configuration(
                "batch.workers must be at least 1".to_string(),
            ));
        }
        self.scoring.validate()
    }
}

impl ScoringConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        let bad = |msg: String| Err(ScreenerError::Configuration(msg));

        let DecisionThresholds { excellent, good } = self.thresholds;
        if !(good.is_finite() && excellent.is_finite() && 0.0 < good && good < excellent && excellent <= 100.0) {
            return bad(format!(
                "scoring.thresholds must satisfy 0 < good < excellent <= 100 (good={}, excellent={})",
                good, excellent
            ));
        }

        for (name, bonus) in [
            ("education_bonus", self.education_bonus),
            ("experience_bonus", self.experience_bonus),
            ("coverage_bonus", self.coverage_bonus),
        ] {
            if !bonus.is_finite() || bonus < 0.0 {
                return bad(format!("scoring.{} must be a non-negative number", name));
            }
        }

        let first = match self.bands.first() {
            Some(band) => band,
            None => return bad("scoring.bands must not be empty".to_string()),
        };
        if first.min_matches != 0 {
            return bad("the first score band must start at min_matches = 0".to_string());
        }

        for band in &self.bands {
            let values = [band.base_floor, band.step, band.base_ceiling, band.score_cap];
            if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
                return bad(format!("band '{}' has a negative or non-finite value", band.name));
            }
            if !(band.base_floor <= band.base_ceiling && band.base_ceiling <= band.score_cap && band.score_cap <= 100.0) {
                return bad(format!(
                    "band '{}' must satisfy base_floor <= base_ceiling <= score_cap <= 100",
                    band.name
                ));
            }
        }

        for pair in self.bands.windows(2) {
            let (lower, upper) = (&pair[0], &pair[1]);
            if lower.min_matches >= upper.min_matches {
                return bad("score bands must be ordered by strictly increasing min_matches".to_string());
            }
            if lower.score_cap >= upper.base_floor {
                return bad(format!(
                    "band '{}' caps at {} which reaches band '{}' starting at {}",
                    lower.name, lower.score_cap, upper.name, upper.base_floor
                ));
            }
        }

        Ok(())
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Default canonical skill vocabulary with aliases
fn default_skills() -> BTreeMap<String, Vec<String>> {
    let entries: &[(&str, &[&str])] = &[
        // Software / Web
        ("Python", &[]),
        ("SQL", &[]),
        ("PostgreSQL", &["postgres"]),
        ("Java", &[]),
        ("JavaScript", &["js", "ecmascript"]),
        ("TypeScript", &[]),
        ("HTML", &["html5"]),
        ("CSS", &["css3"]),
        ("React", &["reactjs"]),
        ("Redux", &[]),
        ("Node.js", &["nodejs"]),
        ("Express.js", &["expressjs"]),
        ("FastAPI", &[]),
        ("Flask", &[]),
        ("Django", &[]),
        ("REST API", &["rest apis", "restful", "restful api"]),
        ("GraphQL", &[]),
        ("Git", &["git version control"]),
        ("CI/CD", &["cicd", "continuous integration", "continuous delivery", "continuous deployment"]),
        ("Jest", &[]),
        ("Playwright", &[]),
        ("Rust", &[]),
        ("C++", &["cpp"]),
        // Cloud / DevOps
        ("AWS", &["amazon web services", "aws cloud"]),
        ("GCP", &["google cloud", "google cloud platform"]),
        ("Azure", &["microsoft azure"]),
        ("Docker", &[]),
        ("Kubernetes", &["k8s"]),
        ("Terraform", &[]),
        ("Linux", &[]),
        // Data / ML
        ("Pandas", &[]),
        ("NumPy", &[]),
        ("scikit-learn", &["sklearn"]),
        ("TensorFlow", &[]),
        ("PyTorch", &["torch"]),
        ("Machine Learning", &[]),
        ("Spark", &["apache spark", "pyspark"]),
        ("Airflow", &["apache airflow"]),
        ("Matplotlib", &[]),
        ("Seaborn", &[]),
        ("Power BI", &["powerbi"]),
        ("Excel", &["ms excel", "microsoft excel"]),
        // Civil / Mechanical / Electrical
        ("AutoCAD", &["auto cad"]),
        ("Revit", &[]),
        ("ArcGIS", &[]),
        ("SAP2000", &["sap 2000"]),
        ("ETABS", &[]),
        ("Primavera P6", &["primavera"]),
        ("SolidWorks", &["solid works"]),
        ("ANSYS", &["ansys workbench"]),
        ("MATLAB", &[]),
        ("Embedded C", &[]),
        ("PCB Design", &["pcb"]),
        ("Altium Designer", &["altium"]),
        ("KiCad", &[]),
        ("PLC", &[]),
        // Business / Finance
        ("QuickBooks", &["quickbooks online"]),
        ("SAP", &["sap erp", "sap business"]),
        ("Financial Reporting", &[]),
        ("Google Analytics", &["ga4", "google analytics 4"]),
        ("Expense Reporting", &[]),
        ("TaxAct", &[]),
        ("BambooHR", &[]),
        ("Oracle Hyperion", &["hyperion"]),
        ("LibreOffice Calc", &[]),
        ("Accounts Receivable", &[]),
        // Education / Creative
        ("Microsoft PowerPoint", &["powerpoint", "ppt"]),
        ("Google Classroom", &["google classroom app"]),
        ("ClassDojo", &["class dojo"]),
        ("Classroom Management", &[]),
        ("Adobe Photoshop", &["photoshop"]),
        ("Adobe Illustrator", &["illustrator"]),
        ("Adobe Premiere Pro", &["premiere", "premiere pro"]),
        ("Adobe After Effects", &["after effects"]),
        ("SketchUp", &["sketch up"]),
        // Healthcare
        ("Patient Safety", &[]),
        ("Clinical Judgment", &["clinical judgement"]),
        ("Clinical Documentation", &[]),
        ("Patient Advocacy", &[]),
        ("ICU", &["intensive care unit"]),
        // Generic
        ("Project Management", &[]),
        ("Site Supervision", &[]),
    ];

    entries
        .iter()
        .map(|(canonical, aliases)| (canonical.to_string(), to_strings(aliases)))
        .collect()
}

/// Default degree labels and the phrasings that indicate them
fn default_degrees() -> BTreeMap<String, Vec<String>> {
    let entries: &[(&str, &[&str])] = &[
        ("BSc", &["bsc", "b.sc", "b.s.", "bachelor of science", "bachelors of science", "bachelor's of science"]),
        ("BA", &["b.a.", "bachelor of arts", "bachelors of arts", "bachelor's of arts"]),
        ("BEng", &["beng", "b.eng", "bachelor of engineering"]),
        ("BTech", &["btech", "b.tech", "bachelor of technology"]),
        ("BPharm", &["bpharm", "b.pharm", "bachelor of pharmacy"]),
        ("Bachelor", &["bachelor's degree", "bachelors degree", "undergraduate degree"]),
        ("MSc", &["msc", "m.sc", "m.s.", "master of science", "masters of science", "master's of science"]),
        ("MA", &["m.a.", "master of arts", "masters of arts", "master's of arts"]),
        ("MEng", &["meng", "m.eng", "master of engineering"]),
        ("MBA", &["mba", "master of business administration"]),
        ("Master", &["master's degree", "masters degree", "graduate degree"]),
        ("PhD", &["phd", "ph.d", "doctorate", "d.phil", "doctor of philosophy"]),
        ("MD", &["m.d.", "doctor of medicine"]),
        ("PharmD", &["pharmd", "doctor of pharmacy"]),
        ("RN", &["registered nurse", "rn"]),
    ];

    entries
        .iter()
        .map(|(label, variants)| (label.to_string(), to_strings(variants)))
        .collect()
}
