//! Read-only lookup tables shared by every request.

/// Header and image URL pairs served by `/json`.
#[rustfmt::skip]
pub(crate) const IMAGES: [(&str, &str); 2] = [
    ("streets", "https://iili.io/JV1pSV.jpg"),
    ("bread",   "https://iili.io/Jj9MWG.jpg"),
];

const HAPPY_GILMORE: [&str; 3] = [
    "Hey, why don't I just go eat some hay, make things out of clay, lay by the bay? I just may!",
    "Yeah, Right, And Grizzly Adams Had A Beard.",
    "My fingers hurt. Oh, well, now your back's gonna hurt, 'cause you just pulled landscaping \
     duty. Anybody else's fingers hurt?... I didn't think so.",
];

const BILLY_MADISON: [&str; 3] = [
    "If peeing your pants is cool, consider me Miles Davis.",
    "I award you no points, and may God have mercy on your soul.",
    "That Veronica Vaughn is one piece of ace, I know from experience dude. If you know what I \
     mean.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Movie {
    Happy,
    Madison,
}

impl Movie {
    /// `happy` or `madison`, in any case.
    pub(crate) fn parse(name: &str) -> Option<Movie> {
        if name.eq_ignore_ascii_case("happy") {
            Some(Movie::Happy)
        } else if name.eq_ignore_ascii_case("madison") {
            Some(Movie::Madison)
        } else {
            None
        }
    }

    /// Quote number `number`, counted from 1.
    pub(crate) fn quote(self, number: i32) -> Option<&'static str> {
        let quotes = match self {
            Movie::Happy => &HAPPY_GILMORE,
            Movie::Madison => &BILLY_MADISON,
        };

        let index = usize::try_from(number).ok()?.checked_sub(1)?;
        quotes.get(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movies() {
        #[rustfmt::skip]
        let cases = [
            ("happy",   Some(Movie::Happy)),
            ("HAPPY",   Some(Movie::Happy)),
            ("Madison", Some(Movie::Madison)),
            ("billy",   None),
            ("",        None),
        ];

        for (name, movie) in cases {
            assert_eq!(Movie::parse(name), movie, "{name:?}");
        }
    }

    #[test]
    fn quote_numbers() {
        assert_eq!(
            Movie::Happy.quote(2),
            Some("Yeah, Right, And Grizzly Adams Had A Beard.")
        );
        assert!(Movie::Madison.quote(3).unwrap().ends_with("If you know what I mean."));
        assert!(HAPPY_GILMORE[2].contains("landscaping duty."));

        for number in [0, 4, -1, i32::MIN, i32::MAX] {
            assert_eq!(Movie::Happy.quote(number), None, "{number}");
            assert_eq!(Movie::Madison.quote(number), None, "{number}");
        }
    }
}
