use std::io::{BufRead, Write};

use anyhow::Context;
use provisioner::{Host, ProvisionReport, Provisioner};
use support::{fs::FileSystem, net::Fetcher, process::ProcessManager};

use crate::prompt::Prompter;

/// Answers given on the command line instead of interactively.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProvisionAnswers {
    pub model: Option<String>,
    pub config_url: Option<String>,
    pub count: Option<u32>,
}

/// Ask for the model and the count, then provision. Invalid answers fail before anything is
/// created on disk or run.
pub async fn provision<R, W, FS, PM, F>(
    prompter: &mut Prompter<R, W>,
    provisioner: &Provisioner<FS, PM, F>,
    answers: &ProvisionAnswers,
) -> anyhow::Result<ProvisionReport>
where
    R: BufRead,
    W: Write,
    FS: FileSystem + Send + Sync,
    PM: ProcessManager + Send + Sync,
    F: Fetcher + Send + Sync,
{
    let model =
        prompter.select_model(answers.model.as_deref(), answers.config_url.as_deref())?;
    let count = prompter.instance_count(answers.count)?;

    writeln!(prompter.output(), "Provisioning {count} instance(s) with {model}")?;
    let report = provisioner.provision(&model, count).await?;

    for provisioned in &report.instances {
        writeln!(
            prompter.output(),
            "✅ instance {} listening on port {}, info saved to {}",
            provisioned.instance.number(),
            provisioned.instance.port(),
            provisioned.info_file.display()
        )?;
    }

    Ok(report)
}

pub async fn start_all<FS, PM>(host: &Host<FS, PM>, out: &mut impl Write) -> anyhow::Result<()>
where
    FS: FileSystem + Send + Sync,
    PM: ProcessManager + Send + Sync,
{
    let started = host.start_all().await?;
    writeln!(out, "started {} instance(s): {:?}", started.len(), started)?;
    Ok(())
}

pub async fn stop_all<FS, PM>(host: &Host<FS, PM>, out: &mut impl Write) -> anyhow::Result<()>
where
    FS: FileSystem + Send + Sync,
    PM: ProcessManager + Send + Sync,
{
    let stopped = host.stop_all().await?;
    writeln!(out, "stopped {} instance(s): {:?}", stopped.len(), stopped)?;
    Ok(())
}

pub async fn ids<FS, PM>(host: &Host<FS, PM>, out: &mut impl Write) -> anyhow::Result<()>
where
    FS: FileSystem + Send + Sync,
    PM: ProcessManager + Send + Sync,
{
    let identities = host
        .identities()
        .await
        .context("Can't read the instances info files")?;

    for identity in identities {
        writeln!(
            out,
            "{}\tNode ID: {}\tDevice ID: {}",
            identity.number,
            identity.node_id.as_deref().unwrap_or("-"),
            identity.device_id.as_deref().unwrap_or("-")
        )?;
    }

    Ok(())
}

pub async fn list<FS, PM>(host: &Host<FS, PM>, out: &mut impl Write) -> anyhow::Result<()>
where
    FS: FileSystem + Send + Sync,
    PM: ProcessManager + Send + Sync,
{
    for instance in host.instances().await? {
        writeln!(
            out,
            "{}\t{}\tport {}",
            instance.number(),
            instance.directory().display(),
            instance.port()
        )?;
    }

    Ok(())
}
