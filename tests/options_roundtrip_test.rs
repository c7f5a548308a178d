mod support;

use support::{headless_view, VIDEO_URL};
use vimeo_bridge::oembed::oembed_url;
use vimeo_bridge::types::{PlayButtonPosition, Preload, VideoQuality};
use vimeo_bridge::{EmbedOptions, PlayerHandle};

fn sample() -> EmbedOptions {
    EmbedOptions {
        autoplay: Some(true),
        loop_playback: Some(false),
        muted: Some(true),
        color: Some("#00adef".into()),
        colors: Some(vec!["000000".into(), "00adef".into()]),
        start_time: Some(12.5),
        end_time: Some(30.0),
        quality: Some(VideoQuality::P720),
        max_quality: Some(VideoQuality::Uhd4k),
        play_button_position: Some(PlayButtonPosition::Center),
        preload: Some(Preload::MetadataOnHover),
        texttrack: Some("en".into()),
        ..Default::default()
    }
}

#[test]
fn options_reach_the_player_constructor_unchanged() {
    let options = sample();
    let handle = PlayerHandle::from_url(VIDEO_URL, options.clone());
    let (mut view, web) = headless_view(&handle);
    view.mount().expect("mount");

    assert_eq!(web.eval_with::<String>("__stub.element").unwrap(), "vimeo-player");
    assert_eq!(web.eval_with::<String>("__stub.options.url").unwrap(), VIDEO_URL);

    let raw: String = web.eval_with("JSON.stringify(__stub.options)").unwrap();
    let received: EmbedOptions = serde_json::from_str(&raw).expect("options decode");
    assert_eq!(received, options);
}

#[test]
fn unset_options_are_not_sent() {
    let handle = PlayerHandle::from_url(VIDEO_URL, EmbedOptions::default());
    let (mut view, web) = headless_view(&handle);
    view.mount().expect("mount");

    let keys: String = web
        .eval_with("Object.keys(__stub.options).join(',')")
        .unwrap();
    assert_eq!(keys, "url");
}

#[test]
fn query_parameters_parse_back_to_the_same_options() {
    let options = sample();
    let url = oembed_url("https://vimeo.com/api/oembed.json", VIDEO_URL, Some(&options)).unwrap();
    let parsed = EmbedOptions::from_query(url.query().expect("query string")).unwrap();

    let expected = EmbedOptions {
        color: Some("00adef".into()),
        ..options
    };
    assert_eq!(parsed, expected);
}
