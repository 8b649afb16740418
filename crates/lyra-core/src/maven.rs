//! Maven coordinate parsing and repository lookup.
//!
//! Coordinates follow `group:name[:classifier[:extra]]:version`; the version
//! segment may be empty, in which case the latest version advertised by a
//! repository's `maven-metadata.xml` is used. The parser probes each of the
//! project's repositories in order and fills the artifact's main/sources/docs
//! URIs from whichever resources answer a ranged GET.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Url;

use crate::Artifact;
use crate::error::ParseError;
use crate::io::ping;
use crate::registry::parser::CoordinateParser;

/// Default repository added by `init`.
pub const MAVEN_CENTRAL: &str = "https://repo.maven.apache.org/maven2";

static COORDINATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^([^: ]+):([^: ]+)(:([^: ]*)(:([^: ]+))?)?:([^: ]+)$").expect("valid pattern")
});

static LATEST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<latest>\s*([^<\s]+)\s*</latest>").expect("valid pattern"));
static RELEASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<release>\s*([^<\s]+)\s*</release>").expect("valid pattern"));

/// A parsed Maven coordinate, before repository lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MavenCoordinate {
    pub group: String,
    pub name: String,
    pub version: Option<String>,
}

/// Split a coordinate slug into its group/name/version parts.
///
/// # Errors
///
/// Returns [`ParseError::Malformed`] when the slug does not match the
/// coordinate pattern. A coordinate with two segments (`group:name`) is
/// accepted with no version.
pub fn parse_coordinate(slug: &str) -> Result<MavenCoordinate, ParseError> {
    if let Some(groups) = COORDINATE.captures(slug) {
        return Ok(MavenCoordinate {
            group: groups[1].to_string(),
            name: groups[2].to_string(),
            version: Some(groups[7].to_string()),
        });
    }

    // group:name with no version segment
    let parts: Vec<&str> = slug.split(':').collect();
    if parts.len() == 2 && !parts[0].is_empty() && !parts[1].is_empty() && !slug.contains(' ') {
        return Ok(MavenCoordinate {
            group: parts[0].to_string(),
            name: parts[1].to_string(),
            version: None,
        });
    }
    Err(ParseError::Malformed(slug.to_string()))
}

/// Coordinate parser backed by the project's Maven repositories.
#[derive(Debug, Clone)]
pub struct MavenParser {
    client: reqwest::Client,
}

impl MavenParser {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn artifact_base(repo: &Url, coord: &MavenCoordinate, version: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            repo.as_str().trim_end_matches('/'),
            coord.group.replace('.', "/"),
            coord.name,
            version,
        )
    }

    async fn latest_version(&self, repo: &Url, coord: &MavenCoordinate) -> Option<String> {
        let url = format!(
            "{}/{}/{}/maven-metadata.xml",
            repo.as_str().trim_end_matches('/'),
            coord.group.replace('.', "/"),
            coord.name,
        );
        let body = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
            .send()
            .await
            .ok()?
            .error_for_status()
            .ok()?
            .text()
            .await
            .ok()?;
        LATEST
            .captures(&body)
            .or_else(|| RELEASE.captures(&body))
            .map(|c| c[1].to_string())
    }
}

#[async_trait]
impl CoordinateParser for MavenParser {
    async fn parse(&self, slug: &str, repos: &[Url]) -> Result<Artifact, ParseError> {
        let coord = parse_coordinate(slug)?;

        for repo in repos {
            let version = match &coord.version {
                Some(v) => v.clone(),
                None => match self.latest_version(repo, &coord).await {
                    Some(v) => v,
                    None => continue,
                },
            };

            let base = Self::artifact_base(repo, &coord, &version);
            let stem = format!("{}-{}", coord.name, version);

            let jar = format!("{base}/{stem}.jar");
            if !ping(&self.client, &jar).await {
                continue;
            }

            let mut artifact = Artifact {
                name: coord.name.clone(),
                group: coord.group.clone(),
                version,
                main: jar,
                ..Artifact::default()
            };

            let sources = format!("{base}/{stem}-sources.jar");
            if ping(&self.client, &sources).await {
                artifact.sources = Some(sources);
            }
            let docs = format!("{base}/{stem}-javadoc.jar");
            if ping(&self.client, &docs).await {
                artifact.docs = Some(docs);
            }

            return Ok(artifact);
        }

        Err(ParseError::NotFound {
            slug: slug.to_string(),
        })
    }
}
