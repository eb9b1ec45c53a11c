use chrono::{Duration, Utc};
use tracing::debug;

use hushy_shared::constants::CURRENCY_CACHE_TTL_HOURS;
use hushy_shared::currency::{detect_currency, Currency};

use crate::error::Result;
use crate::state::{Context, CURRENCY_KEY};

#[derive(Clone)]
pub struct CurrencyService {
    ctx: Context,
}

impl CurrencyService {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    /// Currency detected earlier, from memory or the cache when it is less
    /// than a day old.
    pub fn cached(&self) -> Result<Option<Currency>> {
        if let Some(currency) = self.ctx.with_state(|s| s.currency)? {
            return Ok(Some(currency));
        }

        let stored = self
            .ctx
            .with_db("load currency", |db| {
                db.kv_get_fresh::<Currency>(
                    CURRENCY_KEY,
                    Duration::hours(CURRENCY_CACHE_TTL_HOURS),
                    Utc::now(),
                )
            })
            .flatten();

        if let Some(currency) = stored {
            self.ctx.with_state(|s| s.currency = Some(currency))?;
        }
        Ok(stored)
    }

    /// Detect from the reverse-geocoded country and the device locale and
    /// remember the result.
    pub fn detect(&self, country: Option<&str>, locale: Option<&str>) -> Result<Currency> {
        let currency = detect_currency(country, locale);
        debug!(?country, ?locale, currency = currency.code(), "currency detected");

        self.ctx.with_state(|s| s.currency = Some(currency))?;
        self.ctx
            .with_db("store currency", |db| db.kv_put(CURRENCY_KEY, &currency));
        Ok(currency)
    }

    /// Cached value when fresh, otherwise a new detection.
    pub fn resolve(&self, country: Option<&str>, locale: Option<&str>) -> Result<Currency> {
        match self.cached()? {
            Some(currency) => Ok(currency),
            None => self.detect(country, locale),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hushy_store::Database;

    use crate::http::ApiClient;
    use crate::state::AppState;

    fn service(db: Option<Database>) -> CurrencyService {
        let api = ApiClient::with_http(reqwest::Client::new(), "http://localhost");
        CurrencyService::new(Context::new(api, AppState::new(db)))
    }

    #[test]
    fn detection_is_remembered() {
        let svc = service(Some(Database::open_in_memory().unwrap()));
        assert_eq!(svc.cached().unwrap(), None);
        assert_eq!(svc.detect(Some("United States"), None).unwrap(), Currency::Usd);
        assert_eq!(svc.resolve(Some("France"), None).unwrap(), Currency::Usd);
    }

    #[test]
    fn stale_cache_is_ignored() {
        let db = Database::open_in_memory().unwrap();
        db.kv_put_at(CURRENCY_KEY, &Currency::Usd, Utc::now() - Duration::hours(25))
            .unwrap();
        let svc = service(Some(db));
        assert_eq!(svc.cached().unwrap(), None);
        assert_eq!(svc.resolve(None, Some("de-DE")).unwrap(), Currency::Eur);
    }

    #[test]
    fn fresh_cache_is_used() {
        let db = Database::open_in_memory().unwrap();
        db.kv_put_at(CURRENCY_KEY, &Currency::Usd, Utc::now() - Duration::hours(2))
            .unwrap();
        let svc = service(Some(db));
        assert_eq!(svc.resolve(Some("Spain"), None).unwrap(), Currency::Usd);
    }

    #[test]
    fn works_without_database() {
        let svc = service(None);
        assert_eq!(svc.resolve(None, None).unwrap().symbol(), "€");
    }
}
