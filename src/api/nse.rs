use super::TickerUniverse;
use crate::config::ProviderConfig;
use crate::{Result, ScoutError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, REFERER, USER_AGENT};
use reqwest::Client;
use std::time::Duration;

const SYMBOL_COLUMN: &str = "SYMBOL";

/// Used whenever the exchange listing cannot be downloaded or parsed
pub const FALLBACK_TICKERS: &[&str] = &[
    "RVNL", "IRFC", "IRCON", "NBCC", "NCC", "RITES", "RAILTEL", "HGINFRA", "KEC",
    "PNCINFRA", "KNRCON", "SJVN", "NHPC", "IRCTC", "GPPL", "ENGINERSIN", "DILIPBLDNG",
    "DATAPATTNS", "MTAR", "SOLARINDS", "GRSE", "COCHINSHIP", "MIDHANI", "BEL", "BEML",
    "APOLLOMICRO", "ZEN", "PARAS", "DYNAMATECH", "HAL", "DEEPAKNTR", "AARTIIND",
    "NAVINFLUOR", "ALKYLAMINE", "FINEORG", "CLEAN", "VINATIORG", "SUDARSCHEM",
    "NOCIL", "IGPL", "PCBL", "ROSSARI", "TATACHEM", "ATUL", "CAMLIN", "CHEMPLAST",
    "GNFC", "GUJALKALI", "MEGHMANI", "NEOGEN", "ALKEM", "AJANTPHARM", "IPCA",
    "NATCOPHARM", "GRANULES", "LAURUSLABS", "SOLARA", "GLENMARK", "MARKSANS",
    "ERIS", "CAPLIPOINT", "WINDLAS", "SYNGENE", "THYROCARE", "KRSNAA", "VIJAYADIAG",
    "RAINBOW", "NEULANDLAB", "JBCHEPHARM", "AARTIDRUGS", "BLISSGVS", "SEQUENT",
    "STRIDES", "WOCKHARDT", "MPHASIS", "KPITTECH", "TANLA", "TATAELXSI",
    "HAPPSTMNDS", "MASTEK", "RATEGAIN", "NEWGEN", "INTELLECT", "ZENSAR", "CYIENT",
    "BIRLASOFT", "ROUTE", "NUCLEUS", "TBOTEK", "AFFLE", "ONMOBILE", "SAKSOFT",
    "NIIT", "CMSINFO", "ECLERX", "LATENTVIEW", "QUICKHEAL", "NELCO", "CDSL", "MCX",
    "ANGELONE", "MOTILALOFS", "IIFL", "CHOLAFIN", "MANAPPURAM", "MUTHOOTMICRO",
    "APTUS", "HOMEFIRST", "SPANDANA", "CREDITACC", "FUSION", "SUNDARMFIN", "REPCO",
    "SATIN", "SURYODAY", "UJJIVANSFB", "UJJIVAN", "SUPRAJIT", "ENDURANCE",
    "CRAFTSMAN", "GABRIEL", "SUBROS", "SUNDRMFAST", "MINDA", "OLECTRA", "EXIDE",
    "LUMAXTECH", "FIEM", "IGARASHI", "TIINDIA", "VSTIND", "ZYDUSWELL", "JYOTHYLAB",
    "BAJAJCON", "BIKAJI", "DEVYANI", "SAPPHIRE", "WESTLIFE", "BARBEQUE", "EASEMYTRIP",
    "NYKAA", "DELHIVERY", "CAMPUS", "CELLO", "DBCORP", "EMAMILTD", "RADICO",
    "TASTYBITSS", "VENKY", "WONDERLA", "CARTRADE", "ZAGGLE", "PAGEIND", "GOKALDAS",
    "RAYMOND", "VEDANT", "KITEX", "VARDHMAN", "TRIDENT", "WELSPUN", "SPORTKING",
    "FILATEX", "DOLLAR", "RUPA", "SUTLEJTEX", "ARVIND", "CANTABIL", "DONEAR",
    "GARWARE", "HIMATSEIDE", "SOBHA", "MAHLIFE", "KOLTEPATIL", "SUNTECK",
    "GREENPANEL", "CENTURYPLY", "ASTRAL", "SUPREMEIND", "ORIENTBELL", "CERA",
    "SOMANYCER", "KAJARIACER", "ACRYSIL", "HEIDELBERG", "NUVOCO", "MOIL", "NMDC",
    "NATIONALUM", "HINDCOPPER", "JINDALSAW", "RATNAMANI", "WELCORP", "SHYAMMETL",
    "TINPLATE", "BANDHANBNK", "IDFCFIRSTB", "FEDERALBNK", "KARURVYSYA", "DCBBANK",
    "EQUITASBNK", "ESAFSFB", "UTKARSHBNK", "AUBANK", "RBLBANK", "CSBBANK",
    "COROMANDEL", "GSFC", "CHAMBLFERT", "KSCL", "RALLIS", "UPL", "BAYER",
    "KAVERI", "GODREJAGRO", "INSECTICID", "GATI", "TCI", "ALLCARGO", "SNOWMAN",
    "ZEEL", "SUNTV", "TVTODAY", "JAGRAN", "SAREGAMA", "TIPS", "BALAJI",
    "INDHOTEL", "TAJGVK", "CHALET", "LEMONTRE", "RECLTD", "PFC", "IREDA",
];

/// Full equity listing from the NSE archive CSV
#[derive(Clone)]
pub struct NseUniverse {
    client: Client,
    url: String,
}

impl NseUniverse {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        // the archive rejects requests that do not look like a browser
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("Mozilla/5.0"));
        headers.insert(REFERER, HeaderValue::from_static("https://www.nseindia.com/"));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            url: config.universe_url.clone(),
        })
    }

    async fn download(&self) -> Result<Vec<String>> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScoutError::Provider(format!(
                "NSE listing returned {}",
                status
            )));
        }

        let body = response.text().await?;
        parse_symbols(&body)
    }
}

/// Pull the trimmed, non-empty `SYMBOL` column out of the listing CSV
pub fn parse_symbols(csv_text: &str) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(csv_text.as_bytes());

    let column = reader
        .headers()?
        .iter()
        .position(|h| h == SYMBOL_COLUMN)
        .ok_or_else(|| ScoutError::MissingData("listing has no SYMBOL column".to_string()))?;

    let mut symbols = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(symbol) = record.get(column).filter(|s| !s.is_empty()) {
            symbols.push(symbol.to_string());
        }
    }

    Ok(symbols)
}

pub fn fallback_tickers() -> Vec<String> {
    FALLBACK_TICKERS.iter().map(|t| t.to_string()).collect()
}

#[async_trait]
impl TickerUniverse for NseUniverse {
    async fn tickers(&self) -> Vec<String> {
        match self.download().await {
            Ok(symbols) if !symbols.is_empty() => {
                tracing::info!("✅ Got {} tickers from NSE", symbols.len());
                symbols
            }
            Ok(_) => {
                tracing::warn!("⚠️  NSE listing was empty, using fallback ticker list");
                fallback_tickers()
            }
            Err(e) => {
                tracing::warn!("⚠️  NSE download failed: {}, using fallback ticker list", e);
                fallback_tickers()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "SYMBOL,NAME OF COMPANY, SERIES, DATE OF LISTING\n\
                           BEL,Bharat Electronics Limited,EQ,22-APR-1992\n\
                           \x20IRFC ,Indian Railway Finance Corporation Limited,EQ,29-JAN-2021\n\
                           ,Blank Row,EQ,01-JAN-2000\n\
                           HAL,Hindustan Aeronautics Limited,EQ,28-MAR-2018\n";

    fn universe_for(url: String) -> NseUniverse {
        let config = ProviderConfig {
            universe_url: url,
            ..ProviderConfig::default()
        };
        NseUniverse::new(&config).unwrap()
    }

    #[test]
    fn test_parse_symbols() {
        let symbols = parse_symbols(LISTING).unwrap();
        assert_eq!(symbols, vec!["BEL", "IRFC", "HAL"]);
    }

    #[test]
    fn test_parse_requires_symbol_column() {
        assert!(parse_symbols("TICKER,NAME\nBEL,Bharat\n").is_err());
    }

    #[tokio::test]
    async fn test_downloads_listing_with_browser_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/EQUITY_L.csv")
            .match_header("user-agent", "Mozilla/5.0")
            .match_header("referer", "https://www.nseindia.com/")
            .with_status(200)
            .with_body(LISTING)
            .create_async()
            .await;

        let tickers = universe_for(format!("{}/EQUITY_L.csv", server.url()))
            .tickers()
            .await;

        mock.assert_async().await;
        assert_eq!(tickers, vec!["BEL", "IRFC", "HAL"]);
    }

    #[tokio::test]
    async fn test_falls_back_on_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/EQUITY_L.csv")
            .with_status(403)
            .create_async()
            .await;

        let tickers = universe_for(format!("{}/EQUITY_L.csv", server.url()))
            .tickers()
            .await;

        assert_eq!(tickers.len(), FALLBACK_TICKERS.len());
        assert!(tickers.iter().any(|t| t == "RVNL"));
    }
}
