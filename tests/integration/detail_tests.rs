//! Integration tests for the detail phase
//!
//! Static detail pages are served by wiremock; the interactive tabs come from an
//! in-memory fake implementing `UiDriver`. Outputs go to a temporary directory.

use async_trait::async_trait;
use club_harvest::browser::{DriverError, Lookup, NodeHandle, UiDriver};
use club_harvest::config::{parse_config, Config, Locator};
use club_harvest::crawler::{DetailCrawler, DetailReport, HttpFetcher, PageSelectors};
use club_harvest::output::{read_table, write_table, UTF8_BOM};
use club_harvest::{Entity, HarvestError};
use club_harvest::logging::SeparatorFormat;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const INSTALLATION_TAB: &str = "//a[@href='#tabInstallations']";
const COMMITTEE_TAB: &str = "tabResult";

/// Creates a test configuration writing into `dir`, with every pause disabled
fn create_test_config(dir: &Path, base_url: &str) -> Config {
    let toml = format!(
        r#"
[site]
base-url = "{base}"
search-url = "{base}/search"

[output]
listing-path = '{listing}'
details-path = '{details}'
partial-path = '{partial}'
log-path = '{log}'
partial-save-every = 5

[http]
timeout-secs = 5

[browser]
wait-timeout-secs = 1
poll-interval-ms = 10
settle-delay = {{ min-ms = 0, max-ms = 0 }}
installation-delay = {{ min-ms = 0, max-ms = 0 }}
committee-delay = {{ min-ms = 0, max-ms = 0 }}

[selectors]
popup = {{ css = "button.close" }}
search-toggle = {{ css = "a.toggle" }}
expanded-search-panel = {{ id = "searchPanel" }}
submit-button = {{ xpath = "//button[@type='submit']" }}
results = {{ css = "div.result-item" }}
name-link = {{ css = "a.club-name" }}
installation-tab = {{ xpath = "{installation_tab}" }}
installation-panel = {{ xpath = "//div[@id='tabInstallations']" }}
committee-tab = {{ id = "{committee_tab}" }}
president-panel = {{ xpath = "//div[contains(@class,'president')]" }}
president-name = {{ css = "a.member" }}
"#,
        base = base_url,
        listing = dir.join("clubs_list.csv").display(),
        details = dir.join("clubs_info.csv").display(),
        partial = dir.join("clubs_info_partial.csv").display(),
        log = dir.join("harvest.log").display(),
        installation_tab = INSTALLATION_TAB,
        committee_tab = COMMITTEE_TAB,
    );
    parse_config(&toml).unwrap()
}

/// Interactive content of one club page
#[derive(Clone, Default)]
struct FakeClub {
    /// Definition values of each installation block
    installations: Vec<Vec<String>>,
    president: Option<String>,
}

/// Scripted detail pages, keyed by URL
#[derive(Default)]
struct FakeClubPages {
    clubs: HashMap<String, FakeClub>,
    broken_navigation: HashSet<String>,
    panicking: HashSet<String>,
    current: Option<String>,
    overlay_checks: usize,
    closed: bool,
}

impl FakeClubPages {
    fn club(&self) -> Option<&FakeClub> {
        self.current.as_ref().and_then(|url| self.clubs.get(url))
    }
}

#[async_trait]
impl UiDriver for FakeClubPages {
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        if self.panicking.contains(url) {
            panic!("renderer crashed on {}", url);
        }
        if self.broken_navigation.contains(url) {
            self.current = None;
            return Err(DriverError::Script(format!("navigation to {} aborted", url)));
        }
        self.current = Some(url.to_string());
        Ok(())
    }

    async fn dismiss_overlay(&mut self, _overlay: &Locator, _timeout: Duration) -> Lookup<()> {
        self.overlay_checks += 1;
        Lookup::NotFound
    }

    async fn expand_panel(
        &mut self,
        _toggle: &Locator,
        _expanded_marker: &Locator,
        _timeout: Duration,
    ) -> Lookup<()> {
        Lookup::NotFound
    }

    async fn submit_and_wait(
        &mut self,
        _control: &Locator,
        _results: &Locator,
        _timeout: Duration,
    ) -> Result<(), DriverError> {
        Ok(())
    }

    async fn enumerate(&mut self, _locator: &Locator) -> Result<Vec<NodeHandle>, DriverError> {
        Ok(Vec::new())
    }

    async fn enumerate_within(
        &mut self,
        node: &NodeHandle,
        locator: &Locator,
    ) -> Result<Vec<NodeHandle>, DriverError> {
        let count = self.club().map(|c| c.installations.len()).unwrap_or(0);
        Ok((0..count).map(|i| node.child(locator.clone(), i)).collect())
    }

    async fn click_tab_and_await_panel(
        &mut self,
        tab: &Locator,
        panel: &Locator,
        _timeout: Duration,
    ) -> Lookup<NodeHandle> {
        let club = match self.club() {
            Some(club) => club,
            None => return Lookup::NotFound,
        };
        let available = match tab.value() {
            INSTALLATION_TAB => !club.installations.is_empty(),
            COMMITTEE_TAB => club.president.is_some(),
            _ => false,
        };
        if available {
            Lookup::Found(NodeHandle::new(panel.clone(), 0))
        } else {
            Lookup::NotFound
        }
    }

    async fn await_visible(&mut self, panel: &Locator, _timeout: Duration) -> Lookup<NodeHandle> {
        match self.club().and_then(|c| c.president.as_ref()) {
            Some(_) => Lookup::Found(NodeHandle::new(panel.clone(), 0)),
            None => Lookup::NotFound,
        }
    }

    async fn read_text(&mut self, _node: &NodeHandle, _sub: &Locator) -> Lookup<String> {
        self.club().and_then(|c| c.president.clone()).into()
    }

    async fn read_texts(&mut self, node: &NodeHandle, _sub: &Locator) -> Vec<String> {
        self.club()
            .and_then(|c| c.installations.get(node.position()))
            .cloned()
            .unwrap_or_default()
    }

    async fn read_attribute(
        &mut self,
        _node: &NodeHandle,
        _sub: &Locator,
        _attr: &str,
    ) -> Lookup<String> {
        Lookup::NotFound
    }

    async fn close(&mut self) {
        self.closed = true;
    }
}

fn club_page(n: u32) -> String {
    format!(
        r#"<html><body>
          <div class="detail-body"><h1>Tennis Club {n} <a href="javascript:void(0)">javascript:void(0)</a></h1></div>
          <div id="colInfo"><dl>
            <dd>Rue du Club {n}</dd>
            <dd>{postal} Ville (Belgique)</dd>
            <dd><a href="mailto:club{n}@example.org">club{n}@example.org</a></dd>
            <dd>02 000 00 {n:02}</dd>
          </dl></div>
          <table class="table-infor"><tbody>
            <tr><td>Jeunes</td><td>{young}</td></tr>
            <tr><td>Total</td><td>{total}</td></tr>
          </tbody></table>
        </body></html>"#,
        n = n,
        postal = 1000 + n,
        young = n * 3,
        total = n * 10,
    )
}

fn seed(n: u32, base_url: &str) -> Entity {
    Entity {
        index: n,
        id: format!("{:04}", n),
        name: format!("TC {} ({:04})", n, n),
        url: format!("{}/club/{}", base_url, n),
        street_address: format!("{}, Ville", 1000 + n),
        postal_code: format!("{}", 1000 + n),
        city: "Ville".to_string(),
        facility_summary: "/".to_string(),
        image_url: "/".to_string(),
    }
}

/// Serves `club_page(n)` for every `n` in `clubs`
async fn mount_club_pages(server: &MockServer, clubs: impl IntoIterator<Item = u32>) {
    for n in clubs {
        Mock::given(method("GET"))
            .and(path(format!("/club/{}", n)))
            .respond_with(ResponseTemplate::new(200).set_body_string(club_page(n)))
            .mount(server)
            .await;
    }
}

fn fake_pages(base_url: &str, clubs: impl IntoIterator<Item = u32>) -> FakeClubPages {
    let mut pages = FakeClubPages::default();
    for n in clubs {
        pages.clubs.insert(
            format!("{}/club/{}", base_url, n),
            FakeClub {
                installations: vec![
                    vec!["Terre battue".to_string(), "4 terrains".to_string()],
                    vec!["".to_string(), "Quick".to_string()],
                ],
                president: Some(format!("President {}", n)),
            },
        );
    }
    pages
}

async fn run_details(
    config: &Config,
    pages: FakeClubPages,
    seeds: &[Entity],
) -> (DetailReport, FakeClubPages) {
    let selectors = PageSelectors::compile(&config.static_page).unwrap();
    let fetcher = HttpFetcher::new(&config.http).unwrap();
    let mut crawler = DetailCrawler::new(config, selectors, fetcher, pages);
    let report = crawler.run(seeds).await.unwrap();
    let (_, pages) = crawler.into_parts();
    (report, pages)
}

/// Data rows of a written table, without the BOM and header
fn data_rows(path: &str) -> Vec<String> {
    let bytes = fs::read(path).unwrap();
    assert!(bytes.starts_with(UTF8_BOM));
    let content = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
    content.lines().skip(1).map(String::from).collect()
}

fn column(row: &str, i: usize) -> String {
    row.split('*').nth(i).unwrap().to_string()
}

/// In-memory sink for the run log
#[derive(Clone, Default)]
struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Routes this thread's log lines into the capture until the guard drops
    fn install() -> (Self, DefaultGuard) {
        let capture = Self::default();
        let subscriber = tracing_subscriber::fmt()
            .event_format(SeparatorFormat)
            .with_writer(capture.clone())
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (capture, guard)
    }

    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn test_enriched_record_merges_all_sources() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_club_pages(&server, [1]).await;

    let dir = tempdir().unwrap();
    let config = create_test_config(dir.path(), &base);
    let seeds = vec![seed(1, &base)];

    let (report, pages) = run_details(&config, fake_pages(&base, [1]), &seeds).await;

    assert_eq!(report.seeds, 1);
    assert_eq!(report.written, 1);
    assert!(pages.closed);

    let content = fs::read_to_string(&config.output.details_path).unwrap();
    let header = content.trim_start_matches('\u{feff}').lines().next().unwrap().to_string();
    assert_eq!(
        header,
        "index*club_id*name_preview*postal_code_preview*city_preview*facility_summary_preview*\
         detail_url*image_url_preview*full_name*street*postal_city_country*phone*website*email*\
         total_members*installation_1*installation_2*installation_3*installation_4*president"
    );

    let rows = data_rows(&config.output.details_path);
    assert_eq!(rows.len(), 1);
    let expected = format!(
        "1*0001*TC 1 (0001)*1001*Ville*/*{}/club/1*/*Tennis Club 1*Rue du Club 1*\
         1001 Ville (Belgique)*02 000 00 01*/*club1@example.org*10*\
         Terre battue*Quick*/*/*President 1",
        base
    );
    assert_eq!(rows[0], expected);
}

#[tokio::test]
async fn test_failing_entity_is_skipped_and_reported() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_club_pages(&server, (1..=20).filter(|n| *n != 7)).await;

    // Club 7 answers, but not with a club detail page
    Mock::given(method("GET"))
        .and(path("/club/7"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>Maintenance</body></html>"))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let config = create_test_config(dir.path(), &base);
    let seeds: Vec<Entity> = (1..=20).map(|n| seed(n, &base)).collect();

    let (logs, _guard) = LogCapture::install();
    let (report, _) = run_details(&config, fake_pages(&base, 1..=20), &seeds).await;

    assert_eq!(report.written, 19);
    assert!(report.fetch_skips.is_empty());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 7);
    assert_eq!(report.failures[0].url, format!("{}/club/7", base));

    let rows = data_rows(&config.output.details_path);
    assert_eq!(rows.len(), 19);
    assert!(rows.iter().all(|row| column(row, 0) != "7"));

    let log = logs.contents();
    let line = format!(" - ERROR - Error scraping {}/club/7: ", base);
    assert_eq!(log.matches(line.as_str()).count(), 1);
    assert!(!log.contains(&format!("Error scraping {}/club/8", base)));
}

#[tokio::test]
async fn test_panicking_entity_does_not_halt_batch() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_club_pages(&server, 1..=3).await;

    let dir = tempdir().unwrap();
    let config = create_test_config(dir.path(), &base);
    let seeds: Vec<Entity> = (1..=3).map(|n| seed(n, &base)).collect();

    let mut pages = fake_pages(&base, 1..=3);
    pages.panicking.insert(format!("{}/club/2", base));

    let (report, pages) = run_details(&config, pages, &seeds).await;

    assert_eq!(report.written, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].url, format!("{}/club/2", base));
    assert!(report.failures[0].reason.contains("panicked"));
    assert!(pages.closed);
}

#[tokio::test]
async fn test_not_found_page_is_skipped() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_club_pages(&server, [2]).await;
    Mock::given(method("GET"))
        .and(path("/club/1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let config = create_test_config(dir.path(), &base);
    let seeds = vec![seed(1, &base), seed(2, &base)];

    let (logs, _guard) = LogCapture::install();
    let (report, _) = run_details(&config, fake_pages(&base, [1, 2]), &seeds).await;

    assert_eq!(report.written, 1);
    assert_eq!(report.fetch_skips.len(), 1);
    assert_eq!(report.fetch_skips[0].index, 1);
    assert!(report.fetch_skips[0].reason.contains("404"));

    let rows = data_rows(&config.output.details_path);
    assert_eq!(rows.len(), 1);
    assert_eq!(column(&rows[0], 1), "0002");

    let log = logs.contents();
    let warning = format!(" - WARN - Failed to fetch {}/club/1: HTTP 404\n", base);
    assert!(log.contains(&warning), "missing fetch warning in:\n{}", log);
}

#[tokio::test]
async fn test_partial_snapshot_is_prefix_of_final() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_club_pages(&server, (1..=12).filter(|n| *n != 3)).await;
    Mock::given(method("GET"))
        .and(path("/club/3"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let config = create_test_config(dir.path(), &base);
    let seeds: Vec<Entity> = (1..=12).map(|n| seed(n, &base)).collect();

    let (report, _) = run_details(&config, fake_pages(&base, 1..=12), &seeds).await;
    assert_eq!(report.written, 11);

    // Last snapshot was taken after seed 10: nine successes among the first ten
    let partial = data_rows(&config.output.partial_path);
    let full = data_rows(&config.output.details_path);
    assert_eq!(partial.len(), 9);
    assert_eq!(partial[..], full[..9]);

    let indices: Vec<String> = partial.iter().map(|row| column(row, 0)).collect();
    assert_eq!(indices, vec!["1", "2", "4", "5", "6", "7", "8", "9", "10"]);
}

#[tokio::test]
async fn test_rerun_is_byte_identical() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_club_pages(&server, 1..=4).await;

    let dir = tempdir().unwrap();
    let config = create_test_config(dir.path(), &base);
    let seeds: Vec<Entity> = (1..=4).map(|n| seed(n, &base)).collect();

    run_details(&config, fake_pages(&base, 1..=4), &seeds).await;
    let first = fs::read(&config.output.details_path).unwrap();

    run_details(&config, fake_pages(&base, 1..=4), &seeds).await;
    let second = fs::read(&config.output.details_path).unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_missing_tabs_fill_sentinels() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_club_pages(&server, 1..=2).await;

    let dir = tempdir().unwrap();
    let config = create_test_config(dir.path(), &base);
    let seeds = vec![seed(1, &base), seed(2, &base)];

    let mut pages = fake_pages(&base, [1]);
    // Club 2 has a single installation and no committee tab
    pages.clubs.insert(
        format!("{}/club/2", base),
        FakeClub {
            installations: vec![vec!["Padel".to_string()]],
            president: None,
        },
    );

    run_details(&config, pages, &seeds).await;

    let rows = data_rows(&config.output.details_path);
    assert_eq!(rows.len(), 2);
    let columns: Vec<String> = (15..20).map(|i| column(&rows[1], i)).collect();
    assert_eq!(columns, vec!["Padel", "/", "/", "/", "/"]);
}

#[tokio::test]
async fn test_navigation_failure_still_writes_record() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_club_pages(&server, [1]).await;

    let dir = tempdir().unwrap();
    let config = create_test_config(dir.path(), &base);
    let seeds = vec![seed(1, &base)];

    let mut pages = fake_pages(&base, [1]);
    pages.broken_navigation.insert(format!("{}/club/1", base));

    let (report, _) = run_details(&config, pages, &seeds).await;

    assert_eq!(report.written, 1);
    let rows = data_rows(&config.output.details_path);
    assert_eq!(column(&rows[0], 8), "Tennis Club 1");
    let dynamic: Vec<String> = (15..20).map(|i| column(&rows[0], i)).collect();
    assert_eq!(dynamic, vec!["/", "/", "/", "/", "/"]);
}

#[tokio::test]
async fn test_overlay_checked_on_first_entity_only() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_club_pages(&server, 1..=3).await;

    let dir = tempdir().unwrap();
    let mut config = create_test_config(dir.path(), &base);
    let seeds: Vec<Entity> = (1..=3).map(|n| seed(n, &base)).collect();

    let (_, pages) = run_details(&config, fake_pages(&base, 1..=3), &seeds).await;
    assert_eq!(pages.overlay_checks, 1);

    config.browser.dismiss_overlay_every_entity = true;
    let (_, pages) = run_details(&config, fake_pages(&base, 1..=3), &seeds).await;
    assert_eq!(pages.overlay_checks, 3);
}

#[test]
fn test_listing_without_url_column_is_fatal() {
    let dir = tempdir().unwrap();
    let listing = dir.path().join("clubs_list.csv");

    let mut content = UTF8_BOM.to_vec();
    content.extend_from_slice("index*id*name\n1*0001*TC 1 (0001)\n".as_bytes());
    fs::write(&listing, content).unwrap();

    let result = read_table::<Entity>(&listing, '*', &["url"]);
    match result {
        Err(HarvestError::MissingColumn { column, .. }) => assert_eq!(column, "url"),
        other => panic!("Expected MissingColumn, got {:?}", other),
    }
}

#[test]
fn test_seed_table_round_trips_postal_codes_as_text() {
    let dir = tempdir().unwrap();
    let listing = dir.path().join("clubs_list.csv");
    let mut seeds = vec![seed(1, "https://clubs.example.org")];
    seeds[0].postal_code = "0100".to_string();

    write_table(&listing, '*', &seeds).unwrap();
    let read: Vec<Entity> = read_table(&listing, '*', &["url"]).unwrap();

    assert_eq!(read[0].postal_code, "0100");
}
