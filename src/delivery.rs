use crate::models::{Ceilings, DeliveryPlan};
use crate::reflow::Splitter;
use crate::utils::escape_text;

/// Heading, download line and description of one post, blank-line
/// separated.
///
/// # Examples
///
/// ```rust
/// use markup_reflow::compose_message;
///
/// let text = compose_message("<b>Game</b>", "magnet:?xt=urn:btih:ab", " desc \n");
/// assert_eq!(
///     text,
///     "<b>Game</b>\n\n<b>Download</b>: <code>magnet:?xt=urn:btih:ab</code>\n\ndesc"
/// );
/// ```
pub fn compose_message(title_with_link: &str, magnet_link: &str, description: &str) -> String {
    format!(
        "{}\n\n<b>Download</b>: <code>{}</code>\n\n{}",
        title_with_link.trim(),
        escape_text(magnet_link.trim()),
        description.trim()
    )
    .trim()
    .to_string()
}

/// Lay `text` out over the channel's ceilings.
///
/// With a cover image the first chunk at the caption ceiling becomes the
/// caption and the rest is re-split at the message ceiling.
pub fn plan_delivery(text: &str, has_cover: bool, ceilings: &Ceilings) -> DeliveryPlan {
    if text.trim().is_empty() {
        DeliveryPlan::default()
    } else if has_cover {
        let mut parts = Splitter::new(ceilings.caption).split(text).into_iter();
        let caption = parts.next();
        let rest = parts.collect::<Vec<_>>().join("\n");
        DeliveryPlan {
            caption,
            messages: Splitter::new(ceilings.message).split(rest.as_str()),
        }
    } else {
        DeliveryPlan {
            caption: None,
            messages: Splitter::new(ceilings.message).split(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabulary::{char_len, is_balanced};

    #[test]
    fn empty_text_gives_empty_plan() {
        assert!(plan_delivery("", true, &Ceilings::default()).is_empty());
        assert!(plan_delivery(" \n ", false, &Ceilings::default()).is_empty());
    }

    #[test]
    fn short_text_with_cover_is_caption_only() {
        let plan = plan_delivery("<b>t</b>\n\nbody", true, &Ceilings::default());
        assert_eq!(plan.caption.as_deref(), Some("<b>t</b>\n\nbody"));
        assert!(plan.messages.is_empty());
    }

    #[test]
    fn text_without_cover_goes_to_messages() {
        let plan = plan_delivery("hello", false, &Ceilings::default());
        assert_eq!(plan.caption, None);
        assert_eq!(plan.messages, vec!["hello"]);
    }

    #[test]
    fn overflow_after_caption_is_resplit_at_message_ceiling() {
        let ceilings = Ceilings {
            caption: 12,
            message: 20,
        };
        let text = "<b>head</b>\n<i>one\ntwo\nthree\nfour\nfive</i>";
        let plan = plan_delivery(text, true, &ceilings);
        assert_eq!(plan.caption.as_deref(), Some("<b>head</b>"));
        assert!(!plan.messages.is_empty());
        for message in &plan.messages {
            assert!(char_len(message) <= 20, "{:?}", message);
            assert!(is_balanced(message), "{:?}", message);
        }
        assert_eq!(
            plan.messages.concat().replace("<i>", "").replace("</i>", "").replace('\n', ""),
            "onetwothreefourfive"
        );
    }

    #[test]
    fn composed_message_escapes_magnet() {
        let text = compose_message("T", "magnet:?xt=urn:btih:ab&dn=<x>", "");
        assert_eq!(
            text,
            "T\n\n<b>Download</b>: <code>magnet:?xt=urn:btih:ab&amp;dn=&lt;x&gt;</code>"
        );
    }
}
