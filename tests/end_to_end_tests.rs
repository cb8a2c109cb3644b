#[cfg(test)]
mod tests {
    use markup_reflow::vocabulary::{char_len, foreign_tags, is_balanced, strip_tags};
    use markup_reflow::*;
    use serde::{Deserialize, Serialize};

    use std::fs::File;
    use std::io::Read;
    use std::path::Path;
    use test_generator::test_resources;

    #[derive(Serialize, Deserialize, Debug)]
    #[serde(rename_all = "camelCase")]
    struct ExpectedTopic {
        pub feed_title: String,
        pub display_title: String,
        pub search_title: String,
        #[serde(default)]
        pub image_url: Option<String>,
        pub magnet_link: String,
        #[serde(default)]
        pub is_updated: bool,
    }

    #[derive(Serialize, Deserialize, Debug)]
    #[serde(rename_all = "camelCase")]
    struct Metadata {
        #[serde(default)]
        pub keyword_labels: Vec<String>,
        #[serde(default)]
        pub split_lengths: Vec<usize>,
        #[serde(default)]
        pub topic: Option<ExpectedTopic>,
    }

    const TEST_TEXTURE_DIR: &str = "./";

    fn without_whitespace(input: &str) -> String {
        input.chars().filter(|c| !c.is_whitespace()).collect()
    }

    fn check_split(markup: &str, max_len: usize) {
        let chunks = split(markup, max_len);
        if markup.trim().is_empty() {
            assert!(chunks.is_empty());
            return;
        }
        for chunk in &chunks {
            assert!(
                char_len(chunk) <= max_len,
                "chunk over {} chars: {:?}",
                max_len,
                chunk
            );
            assert!(is_balanced(chunk), "unbalanced chunk: {:?}", chunk);
            assert!(!chunk.trim().is_empty());
        }
        let visible: String = chunks.iter().map(|c| strip_tags(c)).collect();
        assert_eq!(
            without_whitespace(&visible),
            without_whitespace(&strip_tags(markup))
        );
    }

    fn check_topic(source: &str, expected: &ExpectedTopic) -> String {
        let topic = extract_topic(source, &expected.feed_title, &TopicOptions::default())
            .expect("page should yield a topic");
        assert_eq!(topic.display_title, expected.display_title);
        assert_eq!(topic.search_title, expected.search_title);
        assert_eq!(topic.image_url, expected.image_url);
        assert_eq!(topic.magnet_link, expected.magnet_link);
        assert_eq!(topic.is_updated, expected.is_updated);

        let text = compose_message(
            &topic.display_title,
            &topic.magnet_link,
            &topic.description,
        );
        let ceilings = Ceilings::default();
        let plan = plan_delivery(&text, topic.image_url.is_some(), &ceilings);
        assert!(!plan.is_empty());
        if let Some(caption) = &plan.caption {
            assert!(char_len(caption) <= ceilings.caption);
        }
        for message in &plan.messages {
            assert!(char_len(message) <= ceilings.message);
        }
        topic.description
    }

    fn test(resource: &str) {
        let source = get_source_from_dir(resource);
        let metadata = get_expected_metadata_from_dir(resource);
        let expected = get_expected_from_dir(resource);

        let markup = match &metadata.topic {
            Some(expected_topic) => check_topic(source.as_str(), expected_topic),
            None => {
                let canonical = canonicalize(source.as_str());
                assert_eq!(canonicalize(canonical.as_str()), canonical);
                tag_keyword_fields(canonical.as_str(), &metadata.keyword_labels)
            }
        };
        assert_eq!(markup, expected.trim_end());
        assert!(foreign_tags(&markup).is_empty());

        for max_len in metadata.split_lengths {
            check_split(markup.as_str(), max_len);
        }
    }

    fn get_file_content(file_path: &str) -> String {
        let path = Path::new(file_path);
        let mut content = String::new();
        let mut file = File::open(path).unwrap();
        file.read_to_string(&mut content).unwrap();
        content
    }

    fn get_source_from_dir(dir: &str) -> String {
        let fil_path = format!("{}{}/source.html", TEST_TEXTURE_DIR, dir);
        get_file_content(fil_path.as_str())
    }

    fn get_expected_metadata_from_dir(dir: &str) -> Metadata {
        let fil_path = format!("{}{}/expected-metadata.json", TEST_TEXTURE_DIR, dir);
        let metadata_string = get_file_content(fil_path.as_str());
        let metadata: Metadata = serde_json::from_str(metadata_string.as_str()).unwrap();
        metadata
    }

    fn get_expected_from_dir(dir: &str) -> String {
        let fil_path = format!("{}{}/expected.html", TEST_TEXTURE_DIR, dir);
        get_file_content(fil_path.as_str())
    }

    #[test_resources("./test_textures/*")]
    fn run(resource: &str) {
        if resource.ends_with("DS_Store") {
            return;
        }
        test(resource);
    }

    #[test]
    fn debug_this() {
        let resource = match std::env::var("MARKUP_REFLOW_DEBUG_RESOURCE") {
            Ok(value) => value,
            Err(_) => return,
        };
        let source = get_source_from_dir(resource.as_str());
        let options = CanonicalOptions {
            debug: true,
            ..Default::default()
        };
        let canonical = canonicalize_with(source.as_str(), &options);
        println!("{}", canonical);
        for (i, chunk) in split(canonical.as_str(), 1024).iter().enumerate() {
            println!("--- chunk {} ({} chars)\n{}", i, char_len(chunk), chunk);
        }
    }
}
