use pretty_assertions::assert_eq;
use sieve_core::mine_channels;

fn mined(text: &str) -> Vec<String> {
    mine_channels(text).into_iter().collect()
}

#[test]
fn finds_handle_and_link_mentions() {
    let text = "vless://id@h:443#@ProxyFeed\ntrojan://a@b:1#t.me/Another_Feed\n";
    assert_eq!(mined(text), vec!["another_feed", "proxyfeed"]);
}

#[test]
fn finds_percent_encoded_mentions() {
    let text = "vless://id@h:443?x=1#join%20%40EncodedChan\nss://k@h:1#t.me%2Fslashchan";
    assert_eq!(mined(text), vec!["encodedchan", "slashchan"]);
}

#[test]
fn finds_double_encoded_mentions() {
    assert_eq!(mined("ss://k@h:1#%2540deepchannel"), vec!["deepchannel"]);
}

#[test]
fn finds_mentions_inside_base64_vmess_payload() {
    // {"ps":"@vmesschan","add":"1.2.3.4"}
    let text = "vmess://eyJwcyI6IkB2bWVzc2NoYW4iLCJhZGQiOiIxLjIuMy40In0=";
    assert!(mined(text).contains(&"vmesschan".to_string()));
}

#[test]
fn ignores_short_names() {
    assert!(mined("trojan://a@b:1#@abcd").is_empty());
}

#[test]
fn dash_link_form_is_recognized() {
    assert_eq!(mined("ss://k@h:1#t.me-DashFeed"), vec!["dashfeed"]);
}
