// src/categorize.rs
//! # Keyword categorizer
//! Assigns every retrieved document to exactly one of five fixed themes.
//!
//! Scoring: each keyword contributes at most 1 if it occurs as a substring of
//! the lower-cased `title + " " + content`. The strictly highest score wins;
//! ties go to the category declared first in [`Category::ALL`]; all-zero
//! documents go to [`Category::CompanyNews`].

use serde::Serialize;

use crate::document::ScoredDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    ExpertAnalysis,
    CompanyNews,
    FinancialPerformance,
    MarketSentiment,
    RiskAssessment,
}

impl Category {
    /// Declaration order; also the tie-break rank (lower index wins).
    pub const ALL: [Category; 5] = [
        Category::ExpertAnalysis,
        Category::CompanyNews,
        Category::FinancialPerformance,
        Category::MarketSentiment,
        Category::RiskAssessment,
    ];

    pub const DEFAULT: Category = Category::CompanyNews;

    pub fn key(self) -> &'static str {
        match self {
            Category::ExpertAnalysis => "expert_analysis",
            Category::CompanyNews => "company_news",
            Category::FinancialPerformance => "financial_performance",
            Category::MarketSentiment => "market_sentiment",
            Category::RiskAssessment => "risk_assessment",
        }
    }

    /// Position in [`Category::ALL`].
    pub fn tie_rank(self) -> usize {
        self as usize
    }

    pub fn title(self) -> &'static str {
        match self {
            Category::ExpertAnalysis => "Expert Analysis & Outlook",
            Category::CompanyNews => "Latest Company News",
            Category::FinancialPerformance => "Financial Performance",
            Category::MarketSentiment => "Market Sentiment",
            Category::RiskAssessment => "Risk Assessment",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Category::ExpertAnalysis => "🎯",
            Category::CompanyNews => "📰",
            Category::FinancialPerformance => "📊",
            Category::MarketSentiment => "📈",
            Category::RiskAssessment => "⚠️",
        }
    }

    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Category::ExpertAnalysis => &[
                "analysis",
                "recommendation",
                "outlook",
                "investment",
                "target price",
                "rating",
                "upgrade",
                "downgrade",
                "analyst",
                "forecast",
            ],
            Category::CompanyNews => &[
                "announced",
                "launch",
                "partnership",
                "acquisition",
                "merger",
                "ceo",
                "executive",
                "product",
                "service",
                "expansion",
            ],
            Category::FinancialPerformance => &[
                "earnings",
                "revenue",
                "profit",
                "loss",
                "eps",
                "quarterly",
                "financial results",
                "sales",
                "income",
                "margin",
            ],
            Category::MarketSentiment => &[
                "bullish",
                "bearish",
                "optimistic",
                "pessimistic",
                "confidence",
                "sentiment",
                "mood",
                "outlook",
                "expectations",
            ],
            Category::RiskAssessment => &[
                "risk",
                "concern",
                "challenge",
                "threat",
                "volatility",
                "uncertainty",
                "decline",
                "drop",
                "fall",
                "warning",
            ],
        }
    }

    /// Task description for the generation prompt; `{symbol}` is interpolated.
    pub fn prompt(self, symbol: &str) -> String {
        match self {
            Category::ExpertAnalysis => format!(
                "Based on analyst reports and expert opinions about {symbol}, provide a comprehensive expert analysis focusing on professional recommendations, target prices, ratings, and investment outlook. Include specific analyst views and price targets where mentioned."
            ),
            Category::CompanyNews => format!(
                "Based on recent company news about {symbol}, summarize the most important developments, announcements, partnerships, and corporate actions. Focus on how these developments might impact the company's future."
            ),
            Category::FinancialPerformance => format!(
                "Based on financial data and earnings reports for {symbol}, analyze the company's financial performance including revenue, earnings, profitability metrics, and financial health indicators."
            ),
            Category::MarketSentiment => format!(
                "Based on market commentary about {symbol}, analyze the overall market sentiment, investor confidence, and market expectations. Include any mentions of bullish/bearish sentiment."
            ),
            Category::RiskAssessment => format!(
                "Based on risk-related information about {symbol}, identify and analyze potential risks, challenges, concerns, and threats facing the company. Include both short-term and long-term risk factors."
            ),
        }
    }

    /// Number of this category's keywords present in `lowered` (each counts once).
    pub fn score(self, lowered: &str) -> usize {
        self.keywords()
            .iter()
            .filter(|kw| lowered.contains(*kw))
            .count()
    }
}

/// Pick the category for already lower-cased text.
pub fn classify(lowered: &str) -> Category {
    let mut best = Category::DEFAULT;
    let mut best_score = 0usize;
    // strict `>` keeps the earliest category on ties
    for cat in Category::ALL {
        let s = cat.score(lowered);
        if s > best_score {
            best = cat;
            best_score = s;
        }
    }
    best
}

/// Total partition of retrieved documents over the five categories.
/// Each list keeps retrieval rank order.
#[derive(Debug, Clone, Default)]
pub struct CategorizedDocuments {
    buckets: [Vec<ScoredDocument>; 5],
}

impl CategorizedDocuments {
    pub fn get(&self, category: Category) -> &[ScoredDocument] {
        &self.buckets[category.tie_rank()]
    }

    /// Non-empty categories in declaration order.
    pub fn non_empty(&self) -> impl Iterator<Item = (Category, &[ScoredDocument])> + '_ {
        Category::ALL
            .into_iter()
            .map(move |c| (c, self.get(c)))
            .filter(|(_, docs)| !docs.is_empty())
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Distinct `source` values in first-seen order, walking categories in
    /// declaration order.
    pub fn distinct_sources(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for (_, docs) in self.non_empty() {
            for d in docs {
                if seen.insert(d.source.as_str()) {
                    out.push(d.source.clone());
                }
            }
        }
        out
    }
}

pub fn categorize(documents: Vec<ScoredDocument>) -> CategorizedDocuments {
    let mut out = CategorizedDocuments::default();
    for doc in documents {
        let cat = classify(&doc.lowercase_text());
        out.buckets[cat.tie_rank()].push(doc);
    }
    out
}
