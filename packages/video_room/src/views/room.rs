use maud::{DOCTYPE, Markup, PreEscaped, html};
use room_protocol::{RoomId, SIGNALING_PATH};

use super::CSS;
use super::client_script::JAVASCRIPT;
use crate::config::RoomConfig;

const PEERJS_URL: &str = "https://unpkg.com/peerjs@1.5.4/dist/peerjs.min.js";

/// Everything the browser client needs to know, as a JS object literal.
///
/// `<` is escaped so nothing inside the JSON can terminate the script element.
fn bootstrap_json(room_id: &RoomId, config: &RoomConfig) -> String {
    serde_json::json!({
        "roomId": room_id,
        "signalingPath": SIGNALING_PATH,
        "media": config.media,
        "peer": config.peer,
    })
    .to_string()
    .replace('<', "\\u003c")
}

pub fn room_page(room_id: &RoomId, config: &RoomConfig) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                title { "Room " (room_id.as_str()) }
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                style { (PreEscaped(CSS)) }
            }
            body {
                header {
                    h1 { "Video Room" }
                    span class="room-link" id="room-link" { (room_id.as_str()) }
                }
                div id="status" { "Requesting camera and microphone..." }
                div id="video-grid" {}

                script { (PreEscaped(format!("window.ROOM_BOOTSTRAP = {};", bootstrap_json(room_id, config)))) }
                script src=(PEERJS_URL) {}
                script { (PreEscaped(JAVASCRIPT)) }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PeerServerConfig;

    #[test]
    fn test_bootstrap_carries_room_and_config() {
        let mut config = RoomConfig::default();
        config.media.video = false;
        config.peer = PeerServerConfig {
            host: Some("peers.local".to_string()),
            port: Some(9000),
            ..Default::default()
        };

        let room_id = RoomId::parse("abc").unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&bootstrap_json(&room_id, &config)).unwrap();
        assert_eq!(json["roomId"], "abc");
        assert_eq!(json["signalingPath"], "/ws");
        assert_eq!(json["media"]["video"], false);
        assert_eq!(json["media"]["audio"], true);
        assert_eq!(json["peer"]["host"], "peers.local");
        assert!(json["peer"].get("path").is_none());
    }

    #[test]
    fn test_bootstrap_escapes_script_terminators() {
        let mut config = RoomConfig::default();
        config.peer.path = Some("</script><script>alert(1)".to_string());

        let room_id = RoomId::parse("abc").unwrap();
        let json = bootstrap_json(&room_id, &config);
        assert!(!json.contains("</script>"));
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["peer"]["path"], "</script><script>alert(1)");
    }

    #[test]
    fn test_page_loads_client_after_bootstrap() {
        let room_id = RoomId::parse("abc").unwrap();
        let html = room_page(&room_id, &RoomConfig::default()).into_string();

        let boot = html.find("window.ROOM_BOOTSTRAP").unwrap();
        let peerjs = html.find(PEERJS_URL).unwrap();
        let client = html.find("join-room").unwrap();
        assert!(boot < peerjs && peerjs < client);
    }
}
