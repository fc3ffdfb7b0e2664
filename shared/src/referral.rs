//! Referral links: where a referrer id comes from at launch, how the
//! invite link is built, and how the visible URL is cleaned afterwards.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::model::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferralSource {
    LaunchParameter,
    Url,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Referral {
    pub referrer_id: String,
    pub source: ReferralSource,
}

impl Referral {
    /// Referrer ids are compared as strings, the way they arrive.
    #[must_use]
    pub fn is_self_referral(&self, user_id: UserId) -> bool {
        self.referrer_id == user_id.to_string()
    }
}

/// Finds a referrer id: the host launch parameter (`<marker><id>`) wins,
/// the `<param>` query parameter of the current URL is the fallback.
#[must_use]
pub fn resolve(launch_parameter: Option<&str>, url: Option<&Url>, marker: &str, param: &str) -> Option<Referral> {
    if let Some(id) = launch_parameter
        .and_then(|p| p.strip_prefix(marker))
        .filter(|id| !id.is_empty())
    {
        return Some(Referral {
            referrer_id: id.to_string(),
            source: ReferralSource::LaunchParameter,
        });
    }

    url?.query_pairs()
        .find(|(k, _)| &**k == param)
        .map(|(_, v)| v.into_owned())
        .filter(|id| !id.is_empty())
        .map(|referrer_id| Referral {
            referrer_id,
            source: ReferralSource::Url,
        })
}

#[must_use]
pub fn has_query_param(url: &Url, param: &str) -> bool {
    url.query_pairs().any(|(k, _)| k == param)
}

/// `url` with every `param` query pair removed and other pairs kept.
#[must_use]
pub fn strip_query_param(url: &Url, param: &str) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| &**k != param)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut clean = url.clone();
    if kept.is_empty() {
        clean.set_query(None);
    } else {
        clean.query_pairs_mut().clear().extend_pairs(kept.iter());
    }
    clean
}

/// Invite link: `base` without query or fragment, plus `?<param>=<id>`.
#[must_use]
pub fn referral_link(base: &Url, param: &str, user_id: UserId) -> Url {
    let mut link = base.clone();
    link.set_fragment(None);
    link.set_query(None);
    link.query_pairs_mut().append_pair(param, &user_id.to_string());
    link
}

/// Platform share URL carrying the invite link and a message.
pub fn share_link(share_base: &str, link: &Url, text: &str) -> Result<Url, url::ParseError> {
    let mut share = Url::parse(share_base)?;
    share
        .query_pairs_mut()
        .append_pair("url", link.as_str())
        .append_pair("text", text);
    Ok(share)
}
