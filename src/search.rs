//! Bulk keyword lookup: keywords read from a workbook column are opened one
//! browser tab at a time in a search engine.

use std::{
    io::{self, BufRead, Write},
    ops::RangeInclusive,
    path::Path,
    thread,
    time::Duration,
};

use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use log::{debug, info};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::{
    config::SearchConfig,
    error::{Error, Result},
};

/// Everything but unreserved characters and `/` is escaped.
const KEYWORD: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

pub fn search_url(template: &str, keyword: &str) -> String {
    let encoded = utf8_percent_encode(keyword, KEYWORD).to_string();
    template.replacen("{}", &encoded, 1)
}

/// Spreadsheet column letters to a 0-based index: `A` is 0, `AA` is 26.
pub fn column_index(column: &str) -> Result<u32> {
    let column = column.trim();
    if column.is_empty() || !column.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(Error::Config(format!("{column:?} is not a column name")));
    }

    let index = column
        .chars()
        .map(|c| c.to_ascii_uppercase() as u32 - 'A' as u32 + 1)
        .try_fold(0u32, |acc, digit| acc.checked_mul(26)?.checked_add(digit))
        .ok_or_else(|| Error::Config(format!("column {column:?} is out of range")))?;
    Ok(index - 1)
}

/// Trimmed, non-empty cell values.
pub fn collect_keywords<I, S>(cells: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    cells
        .into_iter()
        .map(|cell| cell.as_ref().trim().to_string())
        .filter(|cell| !cell.is_empty())
        .collect()
}

pub trait Browser {
    fn open(&mut self, url: &str) -> Result<()>;
}

/// Opens tabs in the system's default browser.
pub struct SystemBrowser;

impl Browser for SystemBrowser {
    fn open(&mut self, url: &str) -> Result<()> {
        webbrowser::open(url).map_err(|source| Error::Browser {
            url: url.to_string(),
            source,
        })
    }
}

pub struct KeywordWorkbook {
    sheets: Sheets<io::BufReader<std::fs::File>>,
    names: Vec<String>,
}

impl KeywordWorkbook {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let sheets = open_workbook_auto(path.as_ref())?;
        let names = sheets.sheet_names();
        if names.is_empty() {
            return Err(Error::EmptyWorkbook);
        }
        Ok(KeywordWorkbook { sheets, names })
    }

    pub fn sheet_names(&self) -> &[String] {
        &self.names
    }

    /// Keywords of sheet `index` in `column`, rows `first_row..=last_row` (1-based).
    pub fn keywords(
        &mut self,
        index: usize,
        column: &str,
        first_row: u32,
        last_row: u32,
    ) -> Result<Vec<String>> {
        let column = column_index(column)?;
        let name = self.names[index].clone();
        let range = self.sheets.worksheet_range(&name)?;
        Ok(keywords_in_range(&range, column, first_row, last_row))
    }
}

fn keywords_in_range(
    range: &Range<Data>,
    column: u32,
    first_row: u32,
    last_row: u32,
) -> Vec<String> {
    // 行号从 1 开始，第 0 行不存在
    let cells = (first_row.max(1)..=last_row).map(|row| {
        range
            .get_value((row - 1, column))
            .map(|value| value.to_string())
            .unwrap_or_default()
    });
    collect_keywords(cells)
}

/// 让用户选择要处理的工作表，输入错误就重新提示
///
/// Returns the 0-based indices of the chosen sheets.
pub fn prompt_sheet_range<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    sheets: &[String],
) -> Result<RangeInclusive<usize>> {
    let total = sheets.len();
    if total == 0 {
        return Err(Error::EmptyWorkbook);
    }

    writeln!(output, "\n可用工作表列表：")?;
    for (i, sheet) in sheets.iter().enumerate() {
        writeln!(output, "[{}] {}", i + 1, sheet)?;
    }

    loop {
        write!(output, "\n请输入起始工作表编号 (1-{total})：")?;
        output.flush()?;
        let start = match read_number(input)? {
            Some(start) => start,
            None => {
                writeln!(output, "请输入有效数字！")?;
                continue;
            }
        };

        write!(
            output,
            "请输入要处理的工作表数量 (1-{})：",
            (total + 1).saturating_sub(start)
        )?;
        output.flush()?;
        let count = match read_number(input)? {
            Some(count) => count,
            None => {
                writeln!(output, "请输入有效数字！")?;
                continue;
            }
        };

        if (1..=total).contains(&start) && count >= 1 {
            let end = start.saturating_add(count - 1).min(total);
            return Ok(start - 1..=end - 1);
        }
        writeln!(output, "输入超出有效范围，请重新输入！")?;
    }
}

fn read_number<R: BufRead>(input: &mut R) -> Result<Option<usize>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed").into());
    }
    Ok(line.trim().parse().ok())
}

/// Opens one tab per keyword, pausing `delay` after each.
pub fn search_keywords<B: Browser>(
    browser: &mut B,
    url_template: &str,
    keywords: &[String],
    delay: Duration,
) -> Result<usize> {
    for keyword in keywords {
        info!("正在搜索：{keyword}");
        let url = search_url(url_template, keyword);
        debug!("opening {url}");
        browser.open(&url)?;
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }
    Ok(keywords.len())
}

/// Interactive run: pick sheets, then search every keyword in them.
pub fn run<R: BufRead, W: Write, B: Browser>(
    config: &SearchConfig,
    workbook: &mut KeywordWorkbook,
    input: &mut R,
    output: &mut W,
    browser: &mut B,
) -> Result<usize> {
    let names = workbook.sheet_names().to_vec();
    let selected = prompt_sheet_range(input, output, &names)?;
    let delay = Duration::from_millis(config.delay_ms);

    let mut searched = 0;
    for index in selected {
        info!("正在处理工作表：{}（{}/{}）", names[index], index + 1, names.len());
        let keywords =
            workbook.keywords(index, &config.column, config.first_row, config.last_row)?;
        searched += search_keywords(browser, &config.url_template, &keywords, delay)?;
    }
    Ok(searched)
}

#[cfg(test)]
mod tests {
    use std::{io::Cursor, time::Duration};

    use calamine::{Data, Range};

    use super::{
        collect_keywords, column_index, keywords_in_range, prompt_sheet_range, search_keywords,
        search_url, Browser,
    };
    use crate::error::Result;

    #[derive(Default)]
    struct RecordingBrowser {
        urls: Vec<String>,
    }

    impl Browser for RecordingBrowser {
        fn open(&mut self, url: &str) -> Result<()> {
            self.urls.push(url.to_string());
            Ok(())
        }
    }

    fn sheets() -> Vec<String> {
        ["上海", "深圳", "杭州", "北京", "苏州"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    fn prompt(input: &str) -> (Result<std::ops::RangeInclusive<usize>>, String) {
        let mut output = Vec::new();
        let result = prompt_sheet_range(&mut Cursor::new(input), &mut output, &sheets());
        (result, String::from_utf8(output).unwrap())
    }

    #[test]
    fn percent_encodes_keywords() {
        let template = "https://www.baidu.com/s?wd={}";
        assert_eq!(
            search_url(template, "黄浦区"),
            "https://www.baidu.com/s?wd=%E9%BB%84%E6%B5%A6%E5%8C%BA"
        );
        assert_eq!(
            search_url(template, "a b&c/d-e"),
            "https://www.baidu.com/s?wd=a%20b%26c/d-e"
        );
    }

    #[test]
    fn column_letters() {
        assert_eq!(column_index("A").unwrap(), 0);
        assert_eq!(column_index("b").unwrap(), 1);
        assert_eq!(column_index("Z").unwrap(), 25);
        assert_eq!(column_index("AA").unwrap(), 26);
        assert!(column_index("").is_err());
        assert!(column_index("B3").is_err());
    }

    #[test]
    fn overlong_column_names_are_rejected() {
        assert_eq!(column_index("ZZZZZZ").unwrap(), 321_272_405);
        assert!(column_index("ZZZZZZZZ").is_err());
        assert!(column_index(&"A".repeat(64)).is_err());
    }

    #[test]
    fn blank_cells_are_skipped() {
        let keywords = collect_keywords(["  外滩 ", "", "   ", "豫园"]);
        assert_eq!(keywords, vec!["外滩", "豫园"]);
    }

    #[test]
    fn reads_the_configured_window() {
        let mut range: Range<Data> = Range::new((0, 0), (49, 2));
        range.set_value((1, 1), Data::String("表头".into()));
        range.set_value((2, 1), Data::String(" 外滩 ".into()));
        range.set_value((3, 1), Data::Empty);
        range.set_value((4, 1), Data::Float(2024.0));
        range.set_value((2, 0), Data::String("别的列".into()));
        range.set_value((45, 1), Data::String("超出范围".into()));

        let keywords = keywords_in_range(&range, 1, 3, 45);
        assert_eq!(keywords, vec!["外滩", "2024"]);
    }

    #[test]
    fn row_zero_is_skipped() {
        let mut range: Range<Data> = Range::new((0, 0), (3, 1));
        range.set_value((0, 1), Data::String("表头".into()));
        range.set_value((1, 1), Data::String("外滩".into()));

        let keywords = keywords_in_range(&range, 1, 0, 2);
        assert_eq!(keywords, vec!["表头", "外滩"]);
    }

    #[test]
    fn valid_range_selection() {
        let (result, output) = prompt("2\n2\n");
        assert_eq!(result.unwrap(), 1..=2);
        assert!(output.contains("[1] 上海"));
        assert!(output.contains("[5] 苏州"));
    }

    #[test]
    fn count_is_clamped_to_the_last_sheet() {
        let (result, _) = prompt("4\n10\n");
        assert_eq!(result.unwrap(), 3..=4);
    }

    #[test]
    fn huge_count_is_clamped() {
        let (result, _) = prompt(&format!("1\n{}\n", usize::MAX));
        assert_eq!(result.unwrap(), 0..=4);

        let (result, _) = prompt(&format!("5\n{}\n", usize::MAX));
        assert_eq!(result.unwrap(), 4..=4);
    }

    #[test]
    fn malformed_numbers_reprompt() {
        let (result, output) = prompt("abc\n1\nx\n1\n1\n");
        assert_eq!(result.unwrap(), 0..=0);
        assert_eq!(output.matches("请输入有效数字！").count(), 2);
    }

    #[test]
    fn out_of_range_reprompts() {
        let (result, output) = prompt("9\n1\n3\n0\n5\n1\n");
        assert_eq!(result.unwrap(), 4..=4);
        assert_eq!(output.matches("输入超出有效范围").count(), 2);
    }

    #[test]
    fn closed_input_is_an_error() {
        let (result, _) = prompt("1\n");
        assert!(result.is_err());
    }

    #[test]
    fn opens_one_tab_per_keyword() {
        let mut browser = RecordingBrowser::default();
        let keywords = vec!["外滩".to_string(), "豫园".to_string()];

        let searched = search_keywords(
            &mut browser,
            "https://example.com/?q={}",
            &keywords,
            Duration::ZERO,
        )
        .unwrap();

        assert_eq!(searched, 2);
        assert_eq!(browser.urls.len(), 2);
        assert!(browser.urls[0].starts_with("https://example.com/?q=%E5%A4%96"));
    }
}
