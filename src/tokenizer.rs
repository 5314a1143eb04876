use jieba_rs::Jieba;

/// 分词能力。聚合器只依赖这个接口
pub trait Segmenter {
    /// Splits `text` into an ordered token sequence. Tokens borrow from `text`.
    fn segment<'a>(&self, text: &'a str) -> Vec<&'a str>;
}

pub struct ChineseTokenizer {
    pub jieba: Jieba,
    pub hmm: bool,
}

impl Default for ChineseTokenizer {
    fn default() -> Self {
        ChineseTokenizer {
            jieba: Jieba::new(),
            hmm: true,
        }
    }
}

impl ChineseTokenizer {
    /// 加入自定义词，避免被切开
    pub fn with_word(mut self, word: &str) -> Self {
        self.jieba.add_word(word, None, None);
        self
    }

    pub fn with_words<'w>(self, words: impl IntoIterator<Item = &'w str>) -> Self {
        words.into_iter().fold(self, |tokenizer, word| tokenizer.with_word(word))
    }

    pub fn with_hmm(mut self, value: bool) -> Self {
        self.hmm = value;
        self
    }
}

impl Segmenter for ChineseTokenizer {
    fn segment<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.jieba.cut(text, self.hmm)
    }
}
