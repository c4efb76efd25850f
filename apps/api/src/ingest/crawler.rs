//! Saramin search-result crawler.
//!
//! Fetches paginated search results, scrapes each job card into a
//! [`JobListing`] and writes the batch out as CSV for the loader. Parsing is
//! synchronous and per-page; nothing from `scraper` is held across an await.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use scraper::{Html, Selector};
use std::path::Path;
use std::time::Duration;

use super::normalize;

/// Column order of the crawler's CSV output. The loader reads these back by
/// header name.
pub const CSV_HEADERS: [&str; 12] = [
    "채용 제목",
    "채용 링크",
    "회사명",
    "회사 링크",
    "지역",
    "경력",
    "학력",
    "고용형태",
    "연봉",
    "직무 분야",
    "등록일",
    "마감일",
];

const BASE_URL: &str = "https://www.saramin.co.kr";
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/91.0.4472.124 Safari/537.36";
const PAGE_DELAY: Duration = Duration::from_secs(3);

/// One scraped job card. Missing fields carry the `정보 없음` placeholder so
/// every row serializes with the full column set.
#[derive(Debug, Clone, serde::Serialize)]
pub struct JobListing {
    pub title: String,
    pub link: String,
    pub company: String,
    pub company_link: String,
    pub location: String,
    pub career: String,
    pub education: String,
    pub employment_type: String,
    pub salary: String,
    pub sectors: String,
    pub register_date: String,
    pub deadline: String,
}

pub fn search_url(keyword: &str, page: u32) -> String {
    format!(
        "{BASE_URL}/zf_user/search/recruit?searchType=search&searchword={keyword}&recruitPage={page}"
    )
}

fn sel(css: &str) -> Selector {
    Selector::parse(css).expect("Invalid selector")
}

fn text_of(el: scraper::ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Scrapes every job card out of one search-result page.
///
/// Cards missing a title anchor are skipped; every other missing field
/// degrades to `정보 없음` rather than dropping the card.
pub fn parse_listing_page(html: &str, today: NaiveDate) -> Vec<JobListing> {
    let document = Html::parse_document(html);
    let card_sel = sel("div.item_recruit");
    let title_sel = sel("h2.job_tit a");
    let company_sel = sel("strong.corp_name a");
    let condition_sel = sel("div.job_condition span");
    let sector_sel = sel("div.job_sector a");
    let register_sel = sel("span.job_day");
    let deadline_sel = sel("span.date");

    let mut listings = Vec::new();
    for card in document.select(&card_sel) {
        let Some(title_el) = card.select(&title_sel).next() else {
            continue;
        };
        let title = title_el
            .value()
            .attr("title")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| text_of(title_el));
        let link = title_el
            .value()
            .attr("href")
            .map(|h| format!("{BASE_URL}{h}"))
            .unwrap_or_else(|| normalize::MISSING.to_string());

        let company_el = card.select(&company_sel).next();
        let company = company_el
            .map(text_of)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| normalize::MISSING.to_string());
        let company_link = company_el
            .and_then(|el| el.value().attr("href"))
            .map(|h| format!("{BASE_URL}{h}"))
            .unwrap_or_else(|| normalize::MISSING.to_string());

        // Condition spans arrive in a fixed order: location, career,
        // education, employment type, salary. Short cards leave the tail
        // columns missing.
        let mut conditions = card.select(&condition_sel).map(text_of);
        let mut next_condition = || {
            conditions
                .next()
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| normalize::MISSING.to_string())
        };
        let location = next_condition();
        let career = next_condition();
        let education = next_condition();
        let employment_type = next_condition();
        let salary = next_condition();

        let sectors = card
            .select(&sector_sel)
            .map(text_of)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        let sectors = if sectors.is_empty() {
            normalize::MISSING.to_string()
        } else {
            sectors
        };

        let deadline = card
            .select(&deadline_sel)
            .next()
            .map(|el| normalize::normalize_listing_deadline(&text_of(el), today))
            .unwrap_or_else(|| normalize::MISSING.to_string());
        let register_date = card
            .select(&register_sel)
            .next()
            .and_then(|el| normalize::normalize_register_date(&text_of(el)))
            .unwrap_or_else(|| normalize::MISSING.to_string());

        listings.push(JobListing {
            title,
            link,
            company,
            company_link,
            location,
            career,
            education,
            employment_type,
            salary,
            sectors,
            register_date,
            deadline,
        });
    }
    listings
}

/// Crawls `pages` search-result pages for `keyword`, pausing between requests
/// so the fetch rate stays polite. A page that fails to fetch is logged and
/// skipped; the crawl continues.
pub async fn crawl(keyword: &str, pages: u32, today: NaiveDate) -> Result<Vec<JobListing>> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to build HTTP client")?;

    let mut all = Vec::new();
    for page in 1..=pages {
        let url = search_url(keyword, page);
        tracing::info!(page, %url, "Fetching search results");
        match fetch_page(&client, &url).await {
            Ok(html) => {
                let listings = parse_listing_page(&html, today);
                tracing::info!(page, count = listings.len(), "Parsed job cards");
                all.extend(listings);
            }
            Err(e) => {
                tracing::error!(page, error = %e, "Failed to fetch page, skipping");
            }
        }
        if page < pages {
            tokio::time::sleep(PAGE_DELAY).await;
        }
    }
    Ok(all)
}

async fn fetch_page(client: &reqwest::Client, url: &str) -> Result<String> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.text().await?)
}

/// Writes the scraped listings to `path` with the standard header row.
pub fn write_csv(listings: &[JobListing], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    writer.write_record(CSV_HEADERS)?;
    for listing in listings {
        writer.write_record([
            &listing.title,
            &listing.link,
            &listing.company,
            &listing.company_link,
            &listing.location,
            &listing.career,
            &listing.education,
            &listing.employment_type,
            &listing.salary,
            &listing.sectors,
            &listing.register_date,
            &listing.deadline,
        ])?;
    }
    writer.flush()?;
    Ok(())
}
