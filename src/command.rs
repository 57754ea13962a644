//! Emulator command synthesis
//!
//! Pure transform from a [`LaunchSpec`] to the exact QEMU invocation.
//! The flag order is a compatibility contract and must not change:
//! cpu, memory, machine, global, devices (in list order), netdev with
//! the SSH host-forward, append, nographic, kernel, initrd, drive,
//! plugin last. Absent optional fields are omitted entirely.

use std::path::Path;

use crate::config::LaunchSpec;

/// Guest-side port the netdev host-forward maps to
const GUEST_SSH_PORT: u16 = 22;

/// A fully synthesized emulator invocation: program plus argument
/// vector, never a shell string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmulatorCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl EmulatorCommand {
    /// Render the invocation as a single command line, for logging and
    /// for compatibility checks against the documented flag order
    pub fn to_command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Synthesize the emulator invocation for a launch spec. Deterministic:
/// identical specs always produce identical commands.
pub fn synthesize(spec: &LaunchSpec) -> EmulatorCommand {
    let mut args: Vec<String> = vec!["-cpu".into(), spec.arch.cpu_model.into()];

    if let Some(memory) = &spec.run.memory {
        args.push("-m".into());
        args.push(memory.clone());
    }
    if let Some(machine) = &spec.run.machine_type {
        args.push("-M".into());
        args.push(machine.clone());
    }
    if let Some(global) = &spec.run.global {
        args.push("-global".into());
        args.push(global.clone());
    }
    for device in &spec.run.devices {
        args.push("-device".into());
        args.push(device.clone());
    }
    if let Some(netdev) = &spec.run.netdev {
        args.push("-netdev".into());
        args.push(format!(
            "{},hostfwd=tcp::{}-:{}",
            netdev, spec.run.port, GUEST_SSH_PORT
        ));
    }
    if let Some(append) = &spec.run.append {
        args.push("-append".into());
        args.push(append.clone());
    }
    if spec.run.nographic {
        args.push("-nographic".into());
    }
    if let Some(kernel) = &spec.image.kernel {
        args.push("-kernel".into());
        args.push(join_image_path(&spec.image_dir, kernel));
    }
    if let Some(initrd) = &spec.image.initrd {
        args.push("-initrd".into());
        args.push(join_image_path(&spec.image_dir, initrd));
    }
    // The drive flag needs both halves: the image path from the image
    // config and the parameter string from the run config
    if let (Some(drive), Some(param)) = (&spec.image.drive, &spec.run.drive_param) {
        args.push("-drive".into());
        args.push(format!(
            "file={},{}",
            join_image_path(&spec.image_dir, drive),
            param
        ));
    }
    args.push("--plugin".into());
    args.push(format!("file={}", spec.plugin_path.display()));

    EmulatorCommand {
        program: spec.arch.emulator_binary(),
        args,
    }
}

fn join_image_path(image_dir: &Path, relative: &str) -> String {
    image_dir.join(relative).display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ArchProfile, ImageConfig, RunConfig, DEFAULT_PORT};
    use std::path::PathBuf;

    fn base_spec() -> LaunchSpec {
        LaunchSpec {
            arch: ArchProfile::lookup("arm64").unwrap(),
            run: RunConfig {
                memory: Some("4096M".into()),
                machine_type: Some("virt".into()),
                global: Some("virtio-blk-device.scsi=off".into()),
                devices: vec![
                    "virtio-scsi-device,id=scsi".into(),
                    "virtio-net-device,netdev=unet".into(),
                ],
                netdev: Some("user,id=unet".into()),
                port: DEFAULT_PORT,
                append: Some("root=/dev/sda2".into()),
                nographic: true,
                drive_param: Some("id=coreimg,cache=unsafe,if=none".into()),
                remote_benchmark_dir: String::new(),
                remote_script: "runner.sh".into(),
            },
            image: ImageConfig {
                kernel: Some("vmlinuz".into()),
                initrd: Some("initrd.img".into()),
                drive: Some("arm64disk.img".into()),
                username: "qsim".into(),
                password: "qsim".into(),
            },
            image_dir: PathBuf::from("images"),
            benchmark_path: PathBuf::from("/tmp/bench"),
            plugin_path: PathBuf::from("plugins/exec-log/exec-log.so"),
        }
    }

    fn position(cmd: &EmulatorCommand, arg: &str) -> usize {
        cmd.args
            .iter()
            .position(|a| a == arg)
            .unwrap_or_else(|| panic!("'{arg}' not in {:?}", cmd.args))
    }

    #[test]
    fn test_synthesize_is_deterministic() {
        let spec = base_spec();
        assert_eq!(synthesize(&spec), synthesize(&spec));
    }

    #[test]
    fn test_full_flag_order() {
        let cmd = synthesize(&base_spec());
        assert_eq!(
            cmd.to_command_line(),
            "./buildDirARM64/aarch64-softmmu/qemu-system-aarch64 \
             -cpu cortex-a57 \
             -m 4096M \
             -M virt \
             -global virtio-blk-device.scsi=off \
             -device virtio-scsi-device,id=scsi \
             -device virtio-net-device,netdev=unet \
             -netdev user,id=unet,hostfwd=tcp::2222-:22 \
             -append root=/dev/sda2 \
             -nographic \
             -kernel images/vmlinuz \
             -initrd images/initrd.img \
             -drive file=images/arm64disk.img,id=coreimg,cache=unsafe,if=none \
             --plugin file=plugins/exec-log/exec-log.so"
        );
    }

    #[test]
    fn test_cpu_flag_always_first_and_plugin_always_last() {
        let mut spec = base_spec();
        spec.run.memory = None;
        spec.run.netdev = None;
        spec.image.kernel = None;
        let cmd = synthesize(&spec);
        assert_eq!(cmd.args[0], "-cpu");
        assert_eq!(cmd.args[cmd.args.len() - 2], "--plugin");
        assert_eq!(
            cmd.args.last().unwrap(),
            "file=plugins/exec-log/exec-log.so"
        );
    }

    #[test]
    fn test_devices_keep_list_order() {
        let cmd = synthesize(&base_spec());
        let first = cmd
            .args
            .iter()
            .position(|a| a == "virtio-scsi-device,id=scsi")
            .unwrap();
        let second = cmd
            .args
            .iter()
            .position(|a| a == "virtio-net-device,netdev=unet")
            .unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_memory_precedes_devices() {
        let cmd = synthesize(&base_spec());
        assert!(position(&cmd, "-m") < position(&cmd, "-device"));
    }

    #[test]
    fn test_netdev_binds_host_forward_to_resolved_port() {
        let mut spec = base_spec();
        spec.run.port = 2022;
        let cmd = synthesize(&spec);
        assert!(cmd
            .args
            .contains(&"user,id=unet,hostfwd=tcp::2022-:22".to_string()));
    }

    #[test]
    fn test_omitted_field_removes_exactly_its_flag() {
        let full = synthesize(&base_spec());

        let mut spec = base_spec();
        spec.run.machine_type = None;
        let without = synthesize(&spec);

        assert!(!without.args.contains(&"-M".to_string()));
        let expected: Vec<&String> = full
            .args
            .iter()
            .filter(|a| *a != "-M" && *a != "virt")
            .collect();
        let actual: Vec<&String> = without.args.iter().collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_nographic_omitted_when_unset() {
        let mut spec = base_spec();
        spec.run.nographic = false;
        let cmd = synthesize(&spec);
        assert!(!cmd.args.contains(&"-nographic".to_string()));
    }

    #[test]
    fn test_drive_needs_both_image_and_param() {
        let mut spec = base_spec();
        spec.run.drive_param = None;
        assert!(!synthesize(&spec).args.contains(&"-drive".to_string()));

        let mut spec = base_spec();
        spec.image.drive = None;
        assert!(!synthesize(&spec).args.contains(&"-drive".to_string()));
    }

    #[test]
    fn test_i386_profile_keeps_empty_cpu_model() {
        let mut spec = base_spec();
        spec.arch = ArchProfile::lookup("i386").unwrap();
        let cmd = synthesize(&spec);
        assert_eq!(
            cmd.program,
            "./buildDirX86/i386-softmmu/qemu-system-i386"
        );
        assert_eq!(cmd.args[0], "-cpu");
        assert_eq!(cmd.args[1], "");
    }
}
