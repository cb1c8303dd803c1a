pub mod survey_archive;
