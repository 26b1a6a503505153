use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::Utc;
use clap::{Args, Subcommand, ValueEnum};
use esg_core::{Article, Error, Result};
use esg_inference::classification::FunnelMode;
use esg_inference::OracleSet;
use serde::Serialize;
use tracing::info;

use crate::analyzer::{AnalyzeOptions, MediaAnalyzer};
use crate::config::PipelineConfig;
use crate::dedup::ClusterStrategy;
use crate::sources::{load_articles, MockNewsSource, SearchPeriod};

/// A duration written like `300ms`, `2s`, `1m`, `2d` or `1h15m`. A bare
/// number means seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HumanDuration(pub Duration);

fn flush_part(number: &mut String, unit: &mut String, total: &mut Duration) -> std::result::Result<(), String> {
    let value: u64 = number
        .parse()
        .map_err(|_| format!("Invalid number in duration: {}", number))?;
    let seconds_per_unit = match unit.as_str() {
        "ms" => None,
        "" | "s" => Some(1),
        "m" => Some(60),
        "h" => Some(3600),
        "d" => Some(86400),
        other => return Err(format!("Invalid duration unit: {}", other)),
    };
    let part = match seconds_per_unit {
        None => Duration::from_millis(value),
        Some(scale) => value
            .checked_mul(scale)
            .map(Duration::from_secs)
            .ok_or_else(|| format!("Duration too large: {}{}", number, unit))?,
    };
    *total = total
        .checked_add(part)
        .ok_or_else(|| "Duration too large".to_string())?;
    number.clear();
    unit.clear();
    Ok(())
}

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total = Duration::ZERO;
        let mut number = String::new();
        let mut unit = String::new();

        for c in s.chars() {
            if c.is_ascii_digit() {
                if !unit.is_empty() {
                    flush_part(&mut number, &mut unit, &mut total)?;
                }
                number.push(c);
            } else if c.is_ascii_alphabetic() {
                if number.is_empty() {
                    return Err(format!("Duration unit without a number: {}", c));
                }
                unit.push(c);
            } else if !c.is_whitespace() {
                return Err(format!("Invalid character in duration: {}", c));
            }
        }

        if number.is_empty() {
            return Err("Duration must include a number".to_string());
        }
        flush_part(&mut number, &mut unit, &mut total)?;

        Ok(HumanDuration(total))
    }
}

#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// JSON file holding an array of search results
    #[arg(long, conflicts_with = "mock", required_unless_present = "mock")]
    pub input: Option<PathBuf>,
    /// Generate synthetic articles for this keyword instead of reading a file
    #[arg(long)]
    pub mock: Option<String>,
    /// Number of synthetic articles
    #[arg(long, default_value_t = 40)]
    pub count: usize,
    /// Keyword the articles were searched for, shown in the report
    #[arg(long)]
    pub keyword: Option<String>,
    /// Drop articles older than this period (y1, m6, m3, m1)
    #[arg(long)]
    pub period: Option<SearchPeriod>,
}

impl InputArgs {
    pub fn keyword(&self) -> Option<String> {
        self.keyword.clone().or_else(|| self.mock.clone())
    }

    pub fn load(&self) -> Result<Vec<Article>> {
        let articles = match (&self.input, &self.mock) {
            (Some(path), _) => load_articles(path)?,
            (None, Some(keyword)) => MockNewsSource::new(keyword).generate(self.count),
            (None, None) => return Err(Error::Config("Either --input or --mock is required".to_string())),
        };

        Ok(match self.period {
            Some(period) => {
                let before = articles.len();
                let kept = period.filter(articles, Utc::now());
                info!("📅 Period {} kept {}/{} articles", period, kept.len(), before);
                kept
            }
            None => articles,
        })
    }
}

/// Overrides for single pipeline settings.
#[derive(Args, Debug, Clone, Default)]
pub struct TuningArgs {
    /// Cosine similarity at or above which two articles are duplicates
    #[arg(long)]
    pub threshold: Option<f64>,
    /// Time window for duplicate grouping (e.g. 48h, 2d)
    #[arg(long)]
    pub window: Option<HumanDuration>,
    /// Cluster by transitive similarity instead of similarity to the seed
    #[arg(long)]
    pub transitive: bool,
    /// Skip every pause between oracle calls
    #[arg(long)]
    pub no_delay: bool,
}

impl TuningArgs {
    pub fn apply(&self, config: &mut PipelineConfig) -> Result<()> {
        if let Some(threshold) = self.threshold {
            if !(-1.0..=1.0).contains(&threshold) {
                return Err(Error::Config(format!("Threshold {} is outside [-1, 1]", threshold)));
            }
            config.dedup.similarity_threshold = threshold;
        }
        if let Some(HumanDuration(window)) = self.window {
            config.dedup.time_window = chrono::Duration::from_std(window)
                .map_err(|e| Error::Config(format!("Window too large: {}", e)))?;
        }
        if self.transitive {
            config.dedup.strategy = ClusterStrategy::Transitive;
        }
        if self.no_delay {
            *config = config.clone().without_delays();
        }
        Ok(())
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModeArg {
    /// Two-stage when the article count reaches the threshold
    #[default]
    Auto,
    Single,
    TwoStage,
}

impl ModeArg {
    pub fn funnel_mode(self) -> Option<FunnelMode> {
        match self {
            ModeArg::Auto => None,
            ModeArg::Single => Some(FunnelMode::SingleStage),
            ModeArg::TwoStage => Some(FunnelMode::TwoStage),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub tuning: TuningArgs,
    /// Number of issues to rank
    #[arg(long)]
    pub top_n: Option<usize>,
    #[arg(long, value_enum, default_value_t = ModeArg::Auto)]
    pub mode: ModeArg,
    /// Classify every article without deduplicating first
    #[arg(long)]
    pub no_dedup: bool,
    /// List only ESG-related articles, most relevant first
    #[arg(long)]
    pub relevant_only: bool,
    /// Write the report here instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct DedupArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub tuning: TuningArgs,
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum PipelineCommands {
    /// Deduplicate, classify and rank ESG issues for a batch of articles
    Analyze(AnalyzeArgs),
    /// Only deduplicate and print the representatives
    Dedup(DedupArgs),
}

fn emit<T: Serialize>(value: &T, output: Option<&PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)?;
            info!("💾 Wrote report to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

pub async fn handle_command(command: PipelineCommands, oracles: OracleSet, mut config: PipelineConfig) -> Result<()> {
    match command {
        PipelineCommands::Analyze(args) => {
            args.tuning.apply(&mut config)?;
            let articles = args.input.load()?;
            let options = AnalyzeOptions {
                deduplicate: !args.no_dedup,
                mode: args.mode.funnel_mode(),
                top_n: args.top_n,
                keyword: args.input.keyword(),
            };

            let analyzer = MediaAnalyzer::new(oracles, config);
            let mut report = analyzer.analyze(articles, options).await;
            if args.relevant_only {
                report.retain_relevant();
            }
            emit(&report, args.output.as_ref())
        }
        PipelineCommands::Dedup(args) => {
            args.tuning.apply(&mut config)?;
            let articles = args.input.load()?;

            let analyzer = MediaAnalyzer::new(oracles, config);
            let report = analyzer.deduplicate(articles).await;
            emit(
                &serde_json::json!({
                    "summary": &report,
                    "representatives": &report.representatives,
                }),
                args.output.as_ref(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use esg_inference::models::DummyModel;

    #[test]
    fn test_human_duration() {
        assert_eq!("300ms".parse::<HumanDuration>().unwrap().0, Duration::from_millis(300));
        assert_eq!("2s".parse::<HumanDuration>().unwrap().0, Duration::from_secs(2));
        assert_eq!("1m".parse::<HumanDuration>().unwrap().0, Duration::from_secs(60));
        assert_eq!("1h15m30s".parse::<HumanDuration>().unwrap().0, Duration::from_secs(4530));
        assert_eq!("2d".parse::<HumanDuration>().unwrap().0, Duration::from_secs(172_800));
        assert_eq!("45".parse::<HumanDuration>().unwrap().0, Duration::from_secs(45));
        assert_eq!("1s500ms".parse::<HumanDuration>().unwrap().0, Duration::from_millis(1500));

        assert!("".parse::<HumanDuration>().is_err());
        assert!("ms".parse::<HumanDuration>().is_err());
        assert!("3w".parse::<HumanDuration>().is_err());
        assert!("1.5h".parse::<HumanDuration>().is_err());
        assert!("99999999999999999999d".parse::<HumanDuration>().is_err());
        assert!(format!("{}d", u64::MAX / 2).parse::<HumanDuration>().is_err());
        assert!(format!("{}s{}s", u64::MAX, u64::MAX).parse::<HumanDuration>().is_err());
    }

    #[test]
    fn test_tuning_overrides() {
        let mut config = PipelineConfig::default();
        let tuning = TuningArgs {
            threshold: Some(0.9),
            window: Some(HumanDuration(Duration::from_secs(86400))),
            transitive: true,
            no_delay: true,
        };
        tuning.apply(&mut config).unwrap();

        assert_eq!(config.dedup.similarity_threshold, 0.9);
        assert_eq!(config.dedup.time_window, chrono::Duration::days(1));
        assert_eq!(config.dedup.strategy, ClusterStrategy::Transitive);
        assert!(config.funnel.classification_delay.is_zero());

        let bad = TuningArgs {
            threshold: Some(1.5),
            ..TuningArgs::default()
        };
        assert!(bad.apply(&mut config).is_err());
    }

    #[tokio::test]
    async fn test_analyze_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("report.json");
        let command = PipelineCommands::Analyze(AnalyzeArgs {
            input: InputArgs {
                input: None,
                mock: Some("테스트전자".to_string()),
                count: 16,
                keyword: None,
                period: None,
            },
            tuning: TuningArgs {
                no_delay: true,
                ..TuningArgs::default()
            },
            top_n: Some(3),
            mode: ModeArg::Auto,
            no_dedup: false,
            relevant_only: true,
            output: Some(output.clone()),
        });

        handle_command(command, OracleSet::from_model(Arc::new(DummyModel)), PipelineConfig::default())
            .await
            .unwrap();

        let report: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(report["keyword"], "테스트전자");
        assert_eq!(report["totalArticles"], 16);
        assert!(report["ranking"]["issues"].as_array().unwrap().len() <= 3);

        let articles = report["articles"].as_array().unwrap();
        assert!(!articles.is_empty());
        assert!(articles.iter().all(|a| a["analysis"]["isESGRelated"] == true));
        let scores: Vec<u64> = articles
            .iter()
            .map(|a| a["analysis"]["relevanceScore"].as_u64().unwrap())
            .collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }
}
