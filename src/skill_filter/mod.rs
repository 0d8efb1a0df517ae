use std::io::Write;

use crate::{
    error::ScrapeError,
    listing::Field,
    prompt::{parse_skill_query, prompt_until, Prompt},
    sink::Table,
};

const RULE: &str = "--------------------------------------------------------------------------";
const EXIT_HINT: &str = "------------------------ Press 'ctrl+c' to exit -----------------------";


/// A loaded table with its skills column lower-cased once for matching.
pub(crate) struct SkillIndex<'a> {
    table: &'a Table,
    skills: Vec<String>,
}


impl<'a> SkillIndex<'a> {
    pub(crate) fn new(table: &'a Table) -> Result<Self, ScrapeError> {
        let column = table
            .column(Field::Skills.header())
            .ok_or(ScrapeError::MissingColumn(Field::Skills.header()))?;
        let skills = table
            .rows
            .iter()
            .map(|row| row.get(column).map(|cell| cell.to_lowercase()).unwrap_or_default())
            .collect();
        Ok(Self { table, skills })
    }

    /// Indices of the rows whose skills mention every one of `query`.
    ///
    /// `query` must already be lower case.
    pub(crate) fn matching(&self, query: &[String]) -> Vec<usize> {
        self.skills
            .iter()
            .enumerate()
            .filter(|(_, skills)| query.iter().all(|skill| skills.contains(skill.as_str())))
            .map(|(i, _)| i)
            .collect()
    }

    /// Prints the given rows as `header: value` blocks.
    pub(crate) fn write_rows<W: Write>(&self, out: &mut W, rows: &[usize]) -> std::io::Result<()> {
        writeln!(out, "{RULE}\n")?;
        for &i in rows {
            writeln!(out, "Job {}:", i + 1)?;
            for (header, value) in self.table.headers.iter().zip(&self.table.rows[i]) {
                writeln!(out, "{header}: {value}")?;
            }
            writeln!(out)?;
        }
        writeln!(out, "{} matching jobs", rows.len())?;
        writeln!(out, "{EXIT_HINT}\n")?;
        out.flush()
    }
}


/// Asks for skill queries and prints the matching rows until input ends.
pub(crate) fn run<P, W>(table: &Table, prompt: &mut P, out: &mut W) -> anyhow::Result<()>
where
    P: Prompt + ?Sized,
    W: Write,
{
    let index = SkillIndex::new(table)?;
    while let Some(query) = prompt_until(prompt, "Enter skills to filter by (separate several with ', '): ", parse_skill_query)? {
        let rows = index.matching(&query);
        index.write_rows(out, &rows)?;
    }
    Ok(())
}
