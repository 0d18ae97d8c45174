//! Built-in passage excerpts used when no scripture backend is configured.

use async_trait::async_trait;

use crate::domain::{Language, PassageError, PassageProvider, Verse};

struct SampleChapter {
    book: &'static str,
    chapter: u32,
    language: Language,
    verses: &'static [(u32, &'static str, &'static str)],
}

const SAMPLE_CHAPTERS: &[SampleChapter] = &[
    SampleChapter {
        book: "Genesis",
        chapter: 1,
        language: Language::Hebrew,
        verses: &[
            (1, "בְּרֵאשִׁית בָּרָא אֱלֹהִים", "In the beginning God created"),
            (2, "אֵת הַשָּׁמַיִם וְאֵת הָאָרֶץ", "the heavens and the earth"),
            (
                3,
                "וְהָאָרֶץ הָיְתָה תֹהוּ וָבֹהוּ",
                "And the earth was without form and void",
            ),
            (
                4,
                "וְחֹשֶׁךְ עַל־פְּנֵי תְהוֹם",
                "and darkness was upon the face of the deep",
            ),
        ],
    },
    SampleChapter {
        book: "John",
        chapter: 3,
        language: Language::Greek,
        verses: &[
            (16, "Οὕτως γὰρ ἠγάπησεν ὁ θεὸς τὸν κόσμον", "For God so loved the world"),
            (
                17,
                "ὥστε τὸν υἱὸν τὸν μονογενῆ ἔδωκεν",
                "that he gave his only begotten Son",
            ),
            (18, "ἵνα πᾶς ὁ πιστεύων εἰς αὐτὸν", "that whoever believes in him"),
            (
                19,
                "μὴ ἀπόληται ἀλλ᾽ ἔχῃ ζωὴν αἰώνιον",
                "should not perish but have everlasting life",
            ),
        ],
    },
    SampleChapter {
        book: "Matthew",
        chapter: 5,
        language: Language::Greek,
        verses: &[
            (
                1,
                "Ἰδὼν δὲ τοὺς ὄχλους ἀνέβη εἰς τὸ ὄρος",
                "And seeing the multitudes, he went up into a mountain",
            ),
            (
                2,
                "καὶ καθίσαντος αὐτοῦ προσῆλθαν αὐτῷ οἱ μαθηταὶ αὐτοῦ",
                "and when he was set, his disciples came unto him",
            ),
            (3, "Μακάριοι οἱ πτωχοὶ τῷ πνεύματι", "Blessed are the poor in spirit"),
            (
                4,
                "ὅτι αὐτῶν ἐστιν ἡ βασιλεία τῶν οὐρανῶν",
                "for theirs is the kingdom of heaven",
            ),
            (5, "Μακάριοι οἱ πενθοῦντες", "Blessed are they that mourn"),
            (6, "ὅτι αὐτοὶ παρακληθήσονται", "for they shall be comforted"),
        ],
    },
];

/// Serves Genesis 1, John 3 and Matthew 5 excerpts.
#[derive(Debug, Default, Clone, Copy)]
pub struct SamplePassageProvider;

impl SamplePassageProvider {
    pub fn new() -> Self {
        Self
    }

    /// `(book, chapter)` pairs this provider can serve.
    pub fn available_chapters(&self) -> Vec<(&'static str, u32)> {
        SAMPLE_CHAPTERS
            .iter()
            .map(|sample| (sample.book, sample.chapter))
            .collect()
    }
}

#[async_trait]
impl PassageProvider for SamplePassageProvider {
    async fn chapter(&self, book: &str, chapter: u32) -> Result<Vec<Verse>, PassageError> {
        let sample = SAMPLE_CHAPTERS
            .iter()
            .find(|sample| sample.book.eq_ignore_ascii_case(book) && sample.chapter == chapter)
            .ok_or_else(|| PassageError::NotFound {
                book: book.to_string(),
                chapter,
            })?;

        Ok(sample
            .verses
            .iter()
            .map(|(number, original, english)| Verse {
                number: *number,
                original_text: original.to_string(),
                english_text: english.to_string(),
                language: sample.language,
            })
            .collect())
    }
}
