//! Publish profile parsing
//!
//! The `publishxml` endpoint answers with a small XML document holding one
//! `<publishProfile/>` element per publish method. Only the attributes we
//! deploy with are extracted; anything else in the document is ignored.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::domain::PublishingProfile;
use crate::error::ProviderError;

const OPERATION: &str = "publish profile";

/// Extract the profile whose `publishMethod` matches `method` (case-insensitive)
///
/// A missing profile is an error; missing attributes inside a found profile
/// are left as `None` for the caller to judge.
pub fn parse(xml: &str, method: &str) -> Result<PublishingProfile, ProviderError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if e.name().as_ref() == b"publishProfile" {
                    if let Some(profile) = read_profile(&e, method)? {
                        return Ok(profile);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ProviderError::Malformed {
                    operation: OPERATION.to_string(),
                    message: format!("XML parse error: {}", e),
                });
            }
            _ => {}
        }
        buf.clear();
    }

    Err(ProviderError::Malformed {
        operation: OPERATION.to_string(),
        message: format!("no publishProfile with publishMethod={}", method),
    })
}

fn read_profile(
    element: &BytesStart<'_>,
    method: &str,
) -> Result<Option<PublishingProfile>, ProviderError> {
    let mut publish_method = None;
    let mut profile = PublishingProfile::default();

    for attr in element.attributes() {
        let attr = attr.map_err(|e| ProviderError::Malformed {
            operation: OPERATION.to_string(),
            message: format!("bad attribute: {}", e),
        })?;
        let value = attr
            .unescape_value()
            .map_err(|e| ProviderError::Malformed {
                operation: OPERATION.to_string(),
                message: format!("bad attribute value: {}", e),
            })?
            .into_owned();

        match attr.key.as_ref() {
            b"publishMethod" => publish_method = Some(value),
            b"publishUrl" => profile.publish_url = Some(value),
            b"userName" => profile.user_name = Some(value),
            b"userPWD" => profile.password = Some(value),
            _ => {}
        }
    }

    let matches = publish_method
        .as_deref()
        .is_some_and(|m| m.eq_ignore_ascii_case(method));

    Ok(matches.then_some(profile))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE: &str = r#"<publishData>
  <publishProfile profileName="webapp1 - Web Deploy" publishMethod="MSDeploy"
      publishUrl="webapp1.scm.azurewebsites.net:443" userName="$webapp1" userPWD="deploy-secret" />
  <publishProfile profileName="webapp1 - FTP" publishMethod="FTP"
      publishUrl="ftp://waws-prod-blu-001.ftp.azurewebsites.windows.net/site/wwwroot"
      ftpPassiveMode="True" userName="webapp1\$webapp1" userPWD="ftp&amp;secret">
    <databases />
  </publishProfile>
</publishData>"#;

    #[test]
    fn test_parse_ftp_profile() {
        let profile = parse(PROFILE, "FTP").unwrap();
        assert_eq!(
            profile.publish_url.as_deref(),
            Some("ftp://waws-prod-blu-001.ftp.azurewebsites.windows.net/site/wwwroot")
        );
        assert_eq!(profile.user_name.as_deref(), Some("webapp1\\$webapp1"));
        assert_eq!(profile.password.as_deref(), Some("ftp&secret"));
    }

    #[test]
    fn test_method_match_is_case_insensitive() {
        let profile = parse(PROFILE, "msdeploy").unwrap();
        assert_eq!(profile.user_name.as_deref(), Some("$webapp1"));
    }

    #[test]
    fn test_missing_method_is_an_error() {
        let err = parse(PROFILE, "ZipDeploy").unwrap_err();
        assert!(matches!(err, ProviderError::Malformed { .. }));
    }

    #[test]
    fn test_missing_attributes_are_left_empty() {
        let xml = r#"<publishData><publishProfile publishMethod="FTP" publishUrl="ftp://host/site/wwwroot"/></publishData>"#;
        let profile = parse(xml, "FTP").unwrap();
        assert!(profile.user_name.is_none());
        assert!(profile.password.is_none());
    }

    #[test]
    fn test_broken_xml_is_an_error() {
        let err = parse("<publishData><publishProfile publishMethod=FTP", "FTP").unwrap_err();
        assert!(matches!(err, ProviderError::Malformed { .. }));
    }
}
